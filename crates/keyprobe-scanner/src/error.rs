use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid scan settings: {0}")]
    InvalidSettings(String),

    #[error("scan worker failed: {0}")]
    WorkerFailed(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
