/// Error type shared by the backend, the gateway and the controller.
///
/// Every variant carries a rendered message rather than the source error so
/// that results can travel inside iced messages, which must be `Clone`.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SorterError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SorterError {
    #[error("database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid source directory: {0}")]
    InvalidSource(String),

    #[error("{0}")]
    Validation(String),

    #[error("image decode error: {0}")]
    Decode(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for SorterError {
    fn from(err: rusqlite::Error) -> Self {
        SorterError::Database(err.to_string())
    }
}

impl From<std::io::Error> for SorterError {
    fn from(err: std::io::Error) -> Self {
        SorterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SorterError {
    fn from(err: serde_json::Error) -> Self {
        SorterError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for SorterError {
    fn from(err: image::ImageError) -> Self {
        SorterError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SorterError {
    fn from(err: tokio::task::JoinError) -> Self {
        SorterError::Task(err.to_string())
    }
}
