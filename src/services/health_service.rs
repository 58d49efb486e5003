use time::OffsetDateTime;
use tracing::warn;

use crate::{
    dto::health::{HealthResponse, StorageStatus},
    error::error_chain,
    state::SharedState,
};

/// Respond with the health payload, probing the storage backend on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage = match state.player_store().health_check().await {
        Ok(()) => StorageStatus::Ok,
        Err(err) => {
            warn!(error = %error_chain(&err), "storage health check failed");
            StorageStatus::Degraded
        }
    };

    HealthResponse::new(state.config().environment, storage, OffsetDateTime::now_utc())
}
