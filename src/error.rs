use thiserror::Error;
use std::io;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Text processing error: {0}")]
    TextProcessing(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread join error: {0}")]
    ThreadJoin(#[from] JoinError),

    /// A lookup against the index failed or timed out; the whole query fails.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Malformed index entry: {0}")]
    MalformedEntry(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error conversions
impl Error {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Error::Storage(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn index_unavailable<S: Into<String>>(msg: S) -> Self {
        Error::IndexUnavailable(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedEntry(msg.into())
    }

    pub fn request<S: Into<String>>(msg: S) -> Self {
        Error::InvalidRequest(msg.into())
    }
}

impl From<crate::parser::ParserError> for Error {
    fn from(err: crate::parser::ParserError) -> Self {
        Error::TextProcessing(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<lmdb_rkv::Error> for Error {
    fn from(err: lmdb_rkv::Error) -> Self {
        Error::Database(err.to_string())
    }
}
