use std::{cmp::Ordering, collections::BinaryHeap};

use time::OffsetDateTime;

/// Player record as persisted by every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEntity {
    /// Normalized username, unique per store.
    pub username: String,
    /// Latest submitted score.
    pub score: f64,
    /// Set once, on the first upsert.
    pub created_at: OffsetDateTime,
    /// Set on every upsert.
    pub updated_at: OffsetDateTime,
}

/// Leaderboard order: highest score first, ties broken by username.
pub fn by_score_desc(a: &PlayerEntity, b: &PlayerEntity) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.username.cmp(&b.username))
}

/// Keep at most `limit` players of `players`, in leaderboard order.
pub fn top_players<I>(players: I, limit: u32) -> Vec<PlayerEntity>
where
    I: IntoIterator<Item = PlayerEntity>,
{
    let mut top = TopPlayers::new(limit);
    top.extend(players);
    top.into_vec()
}

/// Bounded leaderboard accumulator.
///
/// Holds at most `limit` players at any time, so a backend that has to visit
/// every record can rank them page by page.
#[derive(Debug)]
pub struct TopPlayers {
    limit: usize,
    // Max-heap whose root is the worst-ranked player kept.
    heap: BinaryHeap<Ranked>,
}

impl TopPlayers {
    /// Empty accumulator keeping up to `limit` players.
    pub fn new(limit: u32) -> Self {
        let limit = limit as usize;
        Self {
            limit,
            heap: BinaryHeap::with_capacity(limit.saturating_add(1)),
        }
    }

    /// Offer one player; the worst-ranked one is evicted when over the limit.
    pub fn push(&mut self, player: PlayerEntity) {
        if self.limit == 0 {
            return;
        }
        if self.heap.len() == self.limit {
            if let Some(mut worst) = self.heap.peek_mut() {
                if by_score_desc(&player, &worst.0).is_lt() {
                    *worst = Ranked(player);
                }
            }
            return;
        }
        self.heap.push(Ranked(player));
    }

    /// Number of players currently kept.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no player has been kept.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Kept players, best first.
    pub fn into_vec(self) -> Vec<PlayerEntity> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Ranked(player)| player)
            .collect()
    }
}

impl Extend<PlayerEntity> for TopPlayers {
    fn extend<I: IntoIterator<Item = PlayerEntity>>(&mut self, players: I) {
        for player in players {
            self.push(player);
        }
    }
}

/// Orders players so that better-ranked compares as smaller.
#[derive(Debug)]
struct Ranked(PlayerEntity);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        by_score_desc(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn player(username: &str, score: f64) -> PlayerEntity {
        let at = datetime!(2024-05-01 10:00:00 UTC);
        PlayerEntity {
            username: username.into(),
            score,
            created_at: at,
            updated_at: at,
        }
    }

    fn names(players: &[PlayerEntity]) -> Vec<&str> {
        players.iter().map(|p| p.username.as_str()).collect()
    }

    #[test]
    fn top_players_orders_by_score_then_name() {
        let players = vec![
            player("carol", 5.0),
            player("bob", 9.0),
            player("alice", 5.0),
            player("dave", 0.0),
        ];
        assert_eq!(
            names(&top_players(players, 10)),
            ["bob", "alice", "carol", "dave"]
        );
    }

    #[test]
    fn accumulator_never_holds_more_than_the_limit() {
        let mut top = TopPlayers::new(3);
        for page in (0..20u32).collect::<Vec<_>>().chunks(4) {
            top.extend(page.iter().map(|i| player(&format!("p{i:02}"), f64::from(i % 7))));
            assert!(top.len() <= 3);
        }
        // p06 and p13 share the top score 6; p05 wins the ties at 5.
        assert_eq!(names(&top.into_vec()), ["p06", "p13", "p05"]);
    }

    #[test]
    fn equal_scores_keep_the_earliest_names() {
        let mut top = TopPlayers::new(2);
        top.extend(["zed", "amy", "kim", "bea"].map(|name| player(name, 1.0)));
        assert_eq!(names(&top.into_vec()), ["amy", "bea"]);
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut top = TopPlayers::new(0);
        top.push(player("alice", 1.0));
        assert!(top.is_empty());
        assert!(top_players(vec![player("bob", 2.0)], 0).is_empty());
    }
}
