//! Player operations: input normalization, storage calls and the mapping to [`Player`].

use time::OffsetDateTime;
use tracing::{debug, error};

use crate::{
    dao::storage::StorageError,
    error::{ServiceError, error_chain},
    state::{
        SharedState,
        player::{ListLimit, Player, PlayerInputError, Score, Username},
    },
};

fn reject(err: PlayerInputError) -> ServiceError {
    debug!(reason = %err, "rejected player input");
    err.into()
}

fn storage_failure(operation: &'static str, err: StorageError) -> ServiceError {
    error!(operation, error = %error_chain(&err), "player storage operation failed");
    err.into()
}

/// Create the player or replace its score, returning the stored record.
pub async fn upsert_player(
    state: &SharedState,
    username: &str,
    score: f64,
) -> Result<Player, ServiceError> {
    let username = Username::parse(username).map_err(reject)?;
    let score = Score::new(score).map_err(reject)?;

    let entity = state
        .player_store()
        .upsert_player(username, score, OffsetDateTime::now_utc())
        .await
        .map_err(|err| storage_failure("upsert_player", err))?;

    debug!(username = %entity.username, score = entity.score, "player upserted");
    Ok(entity.into())
}

/// Look a player up by name; `Ok(None)` when no such player exists.
pub async fn get_player(state: &SharedState, username: &str) -> Result<Option<Player>, ServiceError> {
    let Some(username) = Username::lookup(username).map_err(reject)? else {
        return Ok(None);
    };

    let entity = state
        .player_store()
        .find_player(username)
        .await
        .map_err(|err| storage_failure("find_player", err))?;
    Ok(entity.map(Player::from))
}

/// Players ordered by score descending, at most `limit` (default 100) of them.
pub async fn list_players(
    state: &SharedState,
    limit: Option<u32>,
) -> Result<Vec<Player>, ServiceError> {
    let limit = ListLimit::new(limit).map_err(reject)?;

    let entities = state
        .player_store()
        .list_top_players(limit.get())
        .await
        .map_err(|err| storage_failure("list_top_players", err))?;
    Ok(entities.into_iter().map(Player::from).collect())
}
