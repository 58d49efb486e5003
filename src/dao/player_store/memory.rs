//! Process-local player store, used by tests and for running without a database.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::{
    dao::{
        models::{PlayerEntity, top_players},
        player_store::PlayerStore,
        storage::StorageResult,
    },
    state::player::{Score, Username},
};

/// Player store backed by a sharded concurrent map.
///
/// Upserts go through the map's entry API, which holds the shard lock for the
/// duration of the write, so concurrent calls for one username serialize.
#[derive(Clone, Default)]
pub struct MemoryPlayerStore {
    players: Arc<DashMap<String, PlayerEntity>>,
}

impl MemoryPlayerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn upsert(&self, username: Username, score: Score, now: OffsetDateTime) -> PlayerEntity {
        match self.players.entry(username.as_str().to_owned()) {
            Entry::Occupied(mut occupied) => {
                let player = occupied.get_mut();
                player.score = score.value();
                player.updated_at = now;
                player.clone()
            }
            Entry::Vacant(vacant) => vacant
                .insert(PlayerEntity {
                    username: username.as_str().to_owned(),
                    score: score.value(),
                    created_at: now,
                    updated_at: now,
                })
                .value()
                .clone(),
        }
    }

    fn find(&self, username: &Username) -> Option<PlayerEntity> {
        self.players
            .get(username.as_str())
            .map(|entry| entry.value().clone())
    }

    fn list(&self, limit: u32) -> Vec<PlayerEntity> {
        let players = self.players.iter().map(|entry| entry.value().clone());
        top_players(players, limit)
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn upsert_player(
        &self,
        username: Username,
        score: Score,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.upsert(username, score, now)) })
    }

    fn find_player(
        &self,
        username: Username,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find(&username)) })
    }

    fn list_top_players(&self, limit: u32) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list(limit)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn name(raw: &str) -> Username {
        Username::parse(raw).unwrap()
    }

    fn score(value: f64) -> Score {
        Score::new(value).unwrap()
    }

    #[tokio::test]
    async fn first_upsert_sets_both_timestamps() {
        let store = MemoryPlayerStore::new();
        let at = datetime!(2024-05-01 10:00 UTC);

        let player = store
            .upsert_player(name("alice"), score(10.0), at)
            .await
            .unwrap();

        assert_eq!(player.created_at, at);
        assert_eq!(player.updated_at, at);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn second_upsert_keeps_created_at() {
        let store = MemoryPlayerStore::new();
        let first = datetime!(2024-05-01 10:00 UTC);
        let second = datetime!(2024-05-01 11:30 UTC);

        store
            .upsert_player(name("alice"), score(10.0), first)
            .await
            .unwrap();
        let player = store
            .upsert_player(name("alice"), score(42.0), second)
            .await
            .unwrap();

        assert_eq!(player.score, 42.0);
        assert_eq!(player.created_at, first);
        assert_eq!(player.updated_at, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn listing_orders_by_score_then_name() {
        let store = MemoryPlayerStore::new();
        let at = datetime!(2024-05-01 10:00 UTC);
        for (raw, value) in [("carol", 5.0), ("bob", 7.0), ("alice", 5.0), ("dave", 1.0)] {
            store
                .upsert_player(name(raw), score(value), at)
                .await
                .unwrap();
        }

        let names: Vec<_> = store
            .list_top_players(3)
            .await
            .unwrap()
            .into_iter()
            .map(|player| player.username)
            .collect();

        assert_eq!(names, ["bob", "alice", "carol"]);
    }

    #[tokio::test]
    async fn missing_player_is_none() {
        let store = MemoryPlayerStore::new();
        assert!(store.find_player(name("nobody")).await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
