use futures::future::BoxFuture;
use sqlx::{PgPool, postgres::PgPoolOptions};
use time::OffsetDateTime;

use super::{
    config::PostgresConfig,
    error::{PostgresDaoError, PostgresResult},
    models::{PLAYERS_TABLE, PlayerRow},
};
use crate::{
    dao::{models::PlayerEntity, player_store::PlayerStore, storage::StorageResult},
    state::player::{Score, Username},
};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    username    VARCHAR(50) PRIMARY KEY,
    score       DOUBLE PRECISION NOT NULL CHECK (score >= 0),
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
)"#;

const CREATE_SCORE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS players_score_idx ON players (score DESC, username ASC)";

// `created_at` is only written by the INSERT branch, so a conflicting row keeps it.
const UPSERT_PLAYER: &str = r#"
INSERT INTO players (username, score, created_at, updated_at)
VALUES ($1, $2, $3, $3)
ON CONFLICT (username) DO UPDATE
SET score = EXCLUDED.score, updated_at = EXCLUDED.updated_at
RETURNING username, score, created_at, updated_at"#;

const FIND_PLAYER: &str =
    "SELECT username, score, created_at, updated_at FROM players WHERE username = $1";

const LIST_TOP_PLAYERS: &str = r#"
SELECT username, score, created_at, updated_at
FROM players
ORDER BY score DESC, username ASC
LIMIT $1"#;

/// [`PlayerStore`] backed by a pooled PostgreSQL connection.
#[derive(Clone)]
pub struct PostgresPlayerStore {
    pool: PgPool,
}

impl PostgresPlayerStore {
    /// Open the connection pool and create the players table when missing.
    pub async fn connect(config: PostgresConfig) -> PostgresResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(&config.url)
            .await
            .map_err(|source| PostgresDaoError::Connect { source })?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> PostgresResult<()> {
        for statement in [CREATE_TABLE, CREATE_SCORE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|source| PostgresDaoError::EnsureSchema {
                    table: PLAYERS_TABLE,
                    source,
                })?;
        }
        Ok(())
    }

    async fn upsert_player(
        &self,
        username: Username,
        score: Score,
        now: OffsetDateTime,
    ) -> PostgresResult<PlayerEntity> {
        let row: PlayerRow = sqlx::query_as(UPSERT_PLAYER)
            .bind(username.as_str())
            .bind(score.value())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::UpsertPlayer {
                username: username.to_string(),
                source,
            })?;
        Ok(row.into())
    }

    async fn find_player(&self, username: Username) -> PostgresResult<Option<PlayerEntity>> {
        let row: Option<PlayerRow> = sqlx::query_as(FIND_PLAYER)
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::LoadPlayer {
                username: username.to_string(),
                source,
            })?;
        Ok(row.map(Into::into))
    }

    async fn list_top_players(&self, limit: u32) -> PostgresResult<Vec<PlayerEntity>> {
        let rows: Vec<PlayerRow> = sqlx::query_as(LIST_TOP_PLAYERS)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::ListPlayers { source })?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> PostgresResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::HealthCheck { source })?;
        Ok(())
    }
}

impl PlayerStore for PostgresPlayerStore {
    fn upsert_player(
        &self,
        username: Username,
        score: Score,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .upsert_player(username, score, now)
                .await
                .map_err(Into::into)
        })
    }

    fn find_player(
        &self,
        username: Username,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_player(username).await.map_err(Into::into) })
    }

    fn list_top_players(&self, limit: u32) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_top_players(limit).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
