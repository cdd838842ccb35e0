use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Seed file error: {0}")]
    Seed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("QR code not found: {0}")]
    NotFound(String),
}

pub type QrResult<T> = Result<T, QrError>;
