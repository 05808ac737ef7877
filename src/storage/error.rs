use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed day records: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No persistent storage is available")]
    Unavailable,
}

impl StorageError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable)
    }
}
