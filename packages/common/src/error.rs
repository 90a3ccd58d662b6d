use thiserror::Error;

/// Failure of a durable local store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage quota exceeded: {size} bytes over a limit of {limit}")]
    QuotaExceeded { size: usize, limit: usize },
}
