use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Download(#[from] teloxide::DownloadError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Extract(#[from] fieldex_extract::Error),

    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
