//! Error types shared by the DynamoDB storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`DynamoDaoError`] failures.
pub type DynamoResult<T> = Result<T, DynamoDaoError>;

/// Failures that can occur while interacting with DynamoDB.
#[derive(Debug, Error)]
pub enum DynamoDaoError {
    /// `DescribeTable` failed for a reason other than a missing table.
    #[error("failed to describe DynamoDB table `{table}`")]
    DescribeTable {
        /// Table name.
        table: String,
        /// SDK error.
        #[source]
        source: aws_sdk_dynamodb::Error,
    },
    /// Building the table definition was rejected by the SDK.
    #[error("invalid DynamoDB table definition for `{table}`")]
    TableDefinition {
        /// Table name.
        table: String,
        /// SDK error.
        #[source]
        source: aws_sdk_dynamodb::error::BuildError,
    },
    /// `CreateTable` failed.
    #[error("failed to create DynamoDB table `{table}`")]
    CreateTable {
        /// Table name.
        table: String,
        /// SDK error.
        #[source]
        source: aws_sdk_dynamodb::Error,
    },
    /// The table never reached the `ACTIVE` status after creation.
    #[error("DynamoDB table `{table}` not active after {attempts} attempt(s)")]
    TableNotActive {
        /// Table name.
        table: String,
        /// Status checks made.
        attempts: u32,
    },
    /// The conditional update backing an upsert failed.
    #[error("failed to upsert player `{username}`")]
    UpsertPlayer {
        /// Normalized username.
        username: String,
        /// SDK error.
        #[source]
        source: aws_sdk_dynamodb::Error,
    },
    /// The upsert succeeded but DynamoDB returned no attributes.
    #[error("DynamoDB returned no attributes for player `{username}`")]
    MissingAttributes {
        /// Normalized username.
        username: String,
    },
    /// `GetItem` failed.
    #[error("failed to load player `{username}`")]
    LoadPlayer {
        /// Normalized username.
        username: String,
        /// SDK error.
        #[source]
        source: aws_sdk_dynamodb::Error,
    },
    /// A `Scan` page failed.
    #[error("failed to scan DynamoDB table `{table}`")]
    ScanPlayers {
        /// Table name.
        table: String,
        /// SDK error.
        #[source]
        source: aws_sdk_dynamodb::Error,
    },
    /// An item lacks an attribute or stores it with an unexpected type.
    #[error("malformed player item: attribute `{attribute}` {problem}")]
    MalformedItem {
        /// Attribute name.
        attribute: &'static str,
        /// What is wrong with it.
        problem: &'static str,
    },
    /// A stored timestamp could not be parsed as RFC 3339.
    #[error("malformed player item: attribute `{attribute}` is not an RFC 3339 timestamp")]
    ParseTimestamp {
        /// Attribute name.
        attribute: &'static str,
        /// SDK error.
        #[source]
        source: time::error::Parse,
    },
    /// A timestamp could not be rendered as RFC 3339.
    #[error("failed to format timestamp")]
    FormatTimestamp {
        /// SDK error.
        #[source]
        source: time::error::Format,
    },
}
