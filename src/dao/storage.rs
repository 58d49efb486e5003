//! Backend-agnostic storage errors.

use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The named backend failed; the driver error is kept as the source.
    #[error("{backend} backend failure")]
    Backend {
        /// Backend label, such as `dynamodb`.
        backend: &'static str,
        /// Driver error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct a backend error from any driver failure.
    pub fn backend(backend: &'static str, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Backend {
            backend,
            source: Box::new(source),
        }
    }
}
