use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("delimiter must not be empty")]
    EmptyDelimiter,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    File {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn file(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::File {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
