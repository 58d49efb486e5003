//! DTO definitions used by the player REST API and documentation layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::{
        missing, not_a_number, validate_lookup_username, validate_score, validate_username,
    },
    state::player::{Player, PlayerInputError},
};

/// Payload creating a player or replacing its score.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AddPlayerRequest {
    /// 1 to 50 characters from `[A-Za-z0-9_-]`, case-insensitive.
    #[serde(default)]
    #[schema(value_type = String, example = "alice")]
    pub username: Option<String>,
    /// Non-negative number. Numeric strings are accepted.
    #[serde(default)]
    #[schema(value_type = f64, example = 42.5)]
    pub score: Option<Value>,
}

impl AddPlayerRequest {
    /// Submitted username, empty when absent.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    /// Submitted score as a float, `None` when absent or not numeric.
    pub fn score(&self) -> Option<f64> {
        match self.score.as_ref()? {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse().ok(),
            _ => None,
        }
    }

    /// Validate the payload and return the raw username and numeric score.
    pub fn validated(&self) -> Result<(&str, f64), ValidationErrors> {
        self.validate()?;
        let score = self.score().ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add("score", not_a_number());
            errors
        })?;
        Ok((self.username(), score))
    }
}

impl Validate for AddPlayerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self.username.as_deref() {
            Some(username) => {
                if let Err(e) = validate_username(username) {
                    errors.add("username", e);
                }
            }
            None => errors.add("username", missing(PlayerInputError::MissingUsername)),
        }

        match (&self.score, self.score()) {
            (None, _) => errors.add("score", missing(PlayerInputError::MissingScore)),
            (Some(_), None) => errors.add("score", not_a_number()),
            (Some(_), Some(score)) => {
                if let Err(e) = validate_score(score) {
                    errors.add("score", e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload looking a player up by name.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GetPlayerRequest {
    /// Name to look up, case-insensitive.
    #[serde(default)]
    #[schema(value_type = String, example = "alice")]
    pub username: Option<String>,
}

impl GetPlayerRequest {
    /// Submitted username, empty when absent.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }
}

impl Validate for GetPlayerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_lookup_username(self.username()) {
            errors.add("username", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Query string of the listing route.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ListPlayersQuery {
    /// Maximum number of players returned (1 to 1000, default 100).
    #[validate(range(min = 1, max = 1000, message = "Limit must be between 1 and 1000"))]
    pub limit: Option<u32>,
}

/// Player as echoed back after an upsert.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddedPlayer {
    pub username: String,
    pub score: f64,
    /// Time of the write.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
}

/// Envelope returned by `POST /api/player/add`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerAddedResponse {
    pub success: bool,
    pub data: AddedPlayer,
}

impl From<Player> for PlayerAddedResponse {
    fn from(player: Player) -> Self {
        Self {
            success: true,
            data: AddedPlayer {
                username: player.username,
                score: player.score,
                timestamp: player.updated_at,
            },
        }
    }
}

/// Name and score of one player.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerScore {
    pub username: String,
    pub score: f64,
}

/// Envelope returned by `POST /api/player/get`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerScoreResponse {
    pub success: bool,
    pub data: PlayerScore,
}

impl From<Player> for PlayerScoreResponse {
    fn from(player: Player) -> Self {
        Self {
            success: true,
            data: PlayerScore {
                username: player.username,
                score: player.score,
            },
        }
    }
}

/// Full player record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetail {
    pub username: String,
    pub score: f64,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl From<Player> for PlayerDetail {
    fn from(player: Player) -> Self {
        Self {
            username: player.username,
            score: player.score,
            created_at: player.created_at,
            updated_at: player.updated_at,
        }
    }
}

/// Envelope returned by `GET /api/player/{username}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerDetailResponse {
    pub success: bool,
    pub data: PlayerDetail,
}

impl From<Player> for PlayerDetailResponse {
    fn from(player: Player) -> Self {
        Self {
            success: true,
            data: player.into(),
        }
    }
}

/// Envelope returned by `GET /api/player`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerListResponse {
    pub success: bool,
    pub data: Vec<PlayerDetail>,
    pub count: usize,
}

impl From<Vec<Player>> for PlayerListResponse {
    fn from(players: Vec<Player>) -> Self {
        let data: Vec<PlayerDetail> = players.into_iter().map(Into::into).collect();
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}
