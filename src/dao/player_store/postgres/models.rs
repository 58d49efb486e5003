use sqlx::FromRow;
use time::OffsetDateTime;

use crate::dao::models::PlayerEntity;

pub const PLAYERS_TABLE: &str = "players";

/// Row shape returned by every player query.
#[derive(Debug, FromRow)]
pub struct PlayerRow {
    pub username: String,
    pub score: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PlayerRow> for PlayerEntity {
    fn from(row: PlayerRow) -> Self {
        Self {
            username: row.username,
            score: row.score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
