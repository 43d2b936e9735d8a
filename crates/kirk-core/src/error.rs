use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ServiceError;

/// Kirk error types
#[derive(Error, Debug)]
pub enum KirkError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Remote service error: {0}")]
    RemoteService(#[from] ServiceError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type KirkResult<T> = Result<T, KirkError>;

impl KirkError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        KirkError::InvalidArgument(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KirkError::Io {
            path: path.into(),
            source,
        }
    }
}
