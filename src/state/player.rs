//! Player domain types and the normalization rules shared by every storage backend.

use std::fmt;

use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::PlayerEntity;

/// Longest username accepted, counted after trimming.
pub const USERNAME_MAX_LEN: usize = 50;
/// Number of players returned by a listing when no limit is given.
pub const DEFAULT_LIST_LIMIT: u32 = 100;
/// Largest listing a caller may request.
pub const MAX_LIST_LIMIT: u32 = 1000;
/// Smallest non-zero score accepted; DynamoDB numbers cannot go lower.
pub const MIN_POSITIVE_SCORE: f64 = 1e-130;
/// Largest score accepted, inside the DynamoDB number range.
pub const MAX_SCORE: f64 = 9.99e125;

/// Reasons a player operation input is rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerInputError {
    /// Absent or blank after trimming.
    #[error("Username is required")]
    MissingUsername,
    /// Longer than [`USERNAME_MAX_LEN`].
    #[error("Username must be between 1 and 50 characters")]
    UsernameLength,
    /// Contains a character outside `[A-Za-z0-9_-]`.
    #[error("Username can only contain letters, numbers, hyphens, and underscores")]
    UsernameCharset,
    /// Absent from the payload.
    #[error("Score is required")]
    MissingScore,
    /// NaN or infinite.
    #[error("Score must be a finite number")]
    ScoreNotFinite,
    /// Below zero.
    #[error("Score must be non-negative")]
    NegativeScore,
    /// Non-zero and outside [`MIN_POSITIVE_SCORE`]..=[`MAX_SCORE`].
    #[error("Score must be 0 or between 1e-130 and 9.99e125")]
    ScoreOutOfRange,
    /// Listing limit outside 1..=[`MAX_LIST_LIMIT`].
    #[error("Limit must be between 1 and 1000")]
    LimitOutOfRange,
}

/// A username that was trimmed, lowercased and checked against the allowed charset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate and normalize a username supplied for a write.
    pub fn parse(raw: &str) -> Result<Self, PlayerInputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PlayerInputError::MissingUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX_LEN {
            return Err(PlayerInputError::UsernameLength);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(PlayerInputError::UsernameCharset);
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Normalize a username supplied for a lookup.
    ///
    /// Only emptiness is an error. A name that could never have been stored
    /// yields `Ok(None)` so callers report it as not found without a backend
    /// round-trip.
    pub fn lookup(raw: &str) -> Result<Option<Self>, PlayerInputError> {
        match Self::parse(raw) {
            Ok(username) => Ok(Some(username)),
            Err(PlayerInputError::MissingUsername) => Err(PlayerInputError::MissingUsername),
            Err(_) => Ok(None),
        }
    }

    /// Borrow the normalized form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A finite, non-negative score that every backend can store exactly.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f64);

impl Score {
    /// Check a raw score value.
    pub fn new(value: f64) -> Result<Self, PlayerInputError> {
        if !value.is_finite() {
            return Err(PlayerInputError::ScoreNotFinite);
        }
        if value < 0.0 {
            return Err(PlayerInputError::NegativeScore);
        }
        // -0.0 is stored as 0.
        if value == 0.0 {
            return Ok(Self(0.0));
        }
        if !(MIN_POSITIVE_SCORE..=MAX_SCORE).contains(&value) {
            return Err(PlayerInputError::ScoreOutOfRange);
        }
        Ok(Self(value))
    }

    /// Raw value.
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Upper bound on the number of players returned by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimit(u32);

impl ListLimit {
    /// Resolve an optional caller-supplied limit, applying the default.
    pub fn new(requested: Option<u32>) -> Result<Self, PlayerInputError> {
        match requested.unwrap_or(DEFAULT_LIST_LIMIT) {
            limit @ 1..=MAX_LIST_LIMIT => Ok(Self(limit)),
            _ => Err(PlayerInputError::LimitOutOfRange),
        }
    }

    /// Limit as a count.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ListLimit {
    fn default() -> Self {
        Self(DEFAULT_LIST_LIMIT)
    }
}

/// A stored player as seen by the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Normalized username.
    pub username: String,
    /// Latest score.
    pub score: f64,
    /// First write.
    pub created_at: OffsetDateTime,
    /// Latest write.
    pub updated_at: OffsetDateTime,
}

impl From<PlayerEntity> for Player {
    fn from(entity: PlayerEntity) -> Self {
        Self {
            username: entity.username,
            score: entity.score,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
