mod config;
mod error;
mod models;
mod store;

pub use config::DynamoConfig;
pub use error::DynamoDaoError;
pub use store::DynamoPlayerStore;

use crate::dao::storage::StorageError;

impl From<DynamoDaoError> for StorageError {
    fn from(err: DynamoDaoError) -> Self {
        StorageError::backend("dynamodb", err)
    }
}
