use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use super::error::{DynamoDaoError, DynamoResult};
use crate::dao::models::PlayerEntity;

pub const USERNAME_ATTR: &str = "username";
pub const SCORE_ATTR: &str = "score";
pub const CREATED_AT_ATTR: &str = "createdAt";
pub const UPDATED_AT_ATTR: &str = "updatedAt";

pub type Item = HashMap<String, AttributeValue>;

pub fn username_key(username: &str) -> AttributeValue {
    AttributeValue::S(username.to_owned())
}

pub fn score_value(score: f64) -> AttributeValue {
    AttributeValue::N(score.to_string())
}

pub fn timestamp_value(at: OffsetDateTime) -> DynamoResult<AttributeValue> {
    at.format(&Rfc3339)
        .map(AttributeValue::S)
        .map_err(|source| DynamoDaoError::FormatTimestamp { source })
}

fn string_attr<'a>(item: &'a Item, attribute: &'static str) -> DynamoResult<&'a str> {
    match item.get(attribute) {
        Some(AttributeValue::S(value)) => Ok(value),
        Some(_) => Err(DynamoDaoError::MalformedItem {
            attribute,
            problem: "is not a string",
        }),
        None => Err(DynamoDaoError::MalformedItem {
            attribute,
            problem: "is missing",
        }),
    }
}

fn number_attr(item: &Item, attribute: &'static str) -> DynamoResult<f64> {
    match item.get(attribute) {
        Some(AttributeValue::N(value)) => {
            value
                .parse::<f64>()
                .map_err(|_| DynamoDaoError::MalformedItem {
                    attribute,
                    problem: "is not a valid number",
                })
        }
        Some(_) => Err(DynamoDaoError::MalformedItem {
            attribute,
            problem: "is not a number",
        }),
        None => Err(DynamoDaoError::MalformedItem {
            attribute,
            problem: "is missing",
        }),
    }
}

fn timestamp_attr(item: &Item, attribute: &'static str) -> DynamoResult<OffsetDateTime> {
    let raw = string_attr(item, attribute)?;
    OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|source| DynamoDaoError::ParseTimestamp { attribute, source })
}

/// Decode a players table item.
pub fn player_from_item(item: &Item) -> DynamoResult<PlayerEntity> {
    Ok(PlayerEntity {
        username: string_attr(item, USERNAME_ATTR)?.to_owned(),
        score: number_attr(item, SCORE_ATTR)?,
        created_at: timestamp_attr(item, CREATED_AT_ATTR)?,
        updated_at: timestamp_attr(item, UPDATED_AT_ATTR)?,
    })
}
