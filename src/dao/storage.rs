use std::error::Error;
use thiserror::Error;

/// Result alias for persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by persistence backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored document exists but does not decode into the expected shape.
    #[error("stored document `{document}` is unreadable")]
    Corrupt {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
