mod config;
mod error;
mod models;
mod store;

pub use config::PostgresConfig;
pub use error::PostgresDaoError;
pub use store::PostgresPlayerStore;

use crate::dao::storage::StorageError;

impl From<PostgresDaoError> for StorageError {
    fn from(err: PostgresDaoError) -> Self {
        StorageError::backend("postgres", err)
    }
}
