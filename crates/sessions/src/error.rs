use thiserror::Error;

/// A setting value the user supplied that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("field index is not an integer: {0:?}")]
    NotAnInteger(String),

    #[error("field index must be non-negative, got {0}")]
    Negative(String),

    #[error("delimiter must not be empty")]
    EmptyDelimiter,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
}

pub type Result<T> = std::result::Result<T, Error>;
