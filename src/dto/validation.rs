//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::player::{PlayerInputError, Score, Username};

fn code(err: &PlayerInputError) -> &'static str {
    match err {
        PlayerInputError::MissingUsername | PlayerInputError::MissingScore => "required",
        PlayerInputError::UsernameLength => "username_length",
        PlayerInputError::UsernameCharset => "username_charset",
        PlayerInputError::ScoreNotFinite => "score_not_finite",
        PlayerInputError::NegativeScore => "score_negative",
        PlayerInputError::ScoreOutOfRange => "score_range",
        PlayerInputError::LimitOutOfRange => "limit_range",
    }
}

impl From<PlayerInputError> for ValidationError {
    fn from(err: PlayerInputError) -> Self {
        let mut validation = ValidationError::new(code(&err));
        validation.message = Some(err.to_string().into());
        validation
    }
}

/// Validates a username submitted for a write: 1 to 50 characters from
/// `[A-Za-z0-9_-]` once surrounding whitespace is removed.
///
/// # Examples
///
/// ```ignore
/// validate_username(" Alice_01 ") // Ok
/// validate_username("")           // Err - required
/// validate_username("bob@home")   // Err - charset
/// ```
pub fn validate_username(raw: &str) -> Result<(), ValidationError> {
    Username::parse(raw).map(drop).map_err(Into::into)
}

/// Validates a username used for a lookup. Only blank names are rejected.
pub fn validate_lookup_username(raw: &str) -> Result<(), ValidationError> {
    Username::lookup(raw).map(drop).map_err(Into::into)
}

/// Validates a score: finite, non-negative and inside the storable range.
pub fn validate_score(value: f64) -> Result<(), ValidationError> {
    Score::new(value).map(drop).map_err(Into::into)
}

/// Error reported for a field that was absent or null.
pub fn missing(err: PlayerInputError) -> ValidationError {
    err.into()
}

/// Error reported for a score that is neither a JSON number nor a numeric string.
pub fn not_a_number() -> ValidationError {
    let mut err = ValidationError::new("score_type");
    err.message = Some("Score must be a number".into());
    err
}
