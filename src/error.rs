use crate::schema::ValidationFailure;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Snapshot checksum mismatch - expected: {expected:08x}, actual: {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    UnsupportedSnapshot { expected: u32, found: u32 },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

impl Error {
    /// True when the error carries a document validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
