//! Error types shared by the PostgreSQL storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`PostgresDaoError`] failures.
pub type PostgresResult<T> = Result<T, PostgresDaoError>;

/// Failures that can occur while interacting with PostgreSQL.
#[derive(Debug, Error)]
pub enum PostgresDaoError {
    /// The pool could not open a connection.
    #[error("failed to connect to PostgreSQL")]
    Connect {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Creating the table or its index failed.
    #[error("failed to prepare the `{table}` table")]
    EnsureSchema {
        /// Table name.
        table: &'static str,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// The `INSERT ... ON CONFLICT` statement failed.
    #[error("failed to upsert player `{username}`")]
    UpsertPlayer {
        /// Normalized username.
        username: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Selecting one player failed.
    #[error("failed to load player `{username}`")]
    LoadPlayer {
        /// Normalized username.
        username: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// The ranked listing query failed.
    #[error("failed to list players")]
    ListPlayers {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// `SELECT 1` failed.
    #[error("PostgreSQL health check failed")]
    HealthCheck {
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
}
