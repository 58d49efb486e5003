use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::config::Environment;

/// Result of the storage backend health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    Ok,
    Degraded,
}

/// Health payload returned by the `/health` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
    /// Deployment environment ("development" or "production").
    pub environment: String,
    /// Server version.
    pub version: String,
    /// Storage status ("ok" or "degraded").
    pub storage: StorageStatus,
}

impl HealthResponse {
    /// Create a health response for the given environment and storage status.
    pub fn new(environment: Environment, storage: StorageStatus, timestamp: OffsetDateTime) -> Self {
        Self {
            success: true,
            message: "Server is running".to_string(),
            timestamp,
            environment: environment.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage,
        }
    }
}
