use std::{sync::Arc, time::Duration};

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{
    Client,
    config::Region,
    types::{
        AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ReturnValue,
        ScalarAttributeType, TableStatus,
    },
};
use futures::future::BoxFuture;
use time::OffsetDateTime;
use tokio::time::sleep;
use tracing::{debug, info};

use super::{
    config::DynamoConfig,
    error::{DynamoDaoError, DynamoResult},
    models::{
        CREATED_AT_ATTR, SCORE_ATTR, UPDATED_AT_ATTR, USERNAME_ATTR, player_from_item, score_value,
        timestamp_value, username_key,
    },
};
use crate::{
    dao::{
        models::{PlayerEntity, TopPlayers},
        player_store::PlayerStore,
        storage::StorageResult,
    },
    state::player::{Score, Username},
};

/// Creates the item when absent and always refreshes score and `updatedAt`.
/// `if_not_exists` keeps the first `createdAt` in the same atomic write.
const UPSERT_EXPRESSION: &str =
    "SET #score = :score, #updated = :now, #created = if_not_exists(#created, :now)";

struct ActivationPolicy;

impl ActivationPolicy {
    const MAX_ATTEMPTS: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 250;

    fn initial_delay() -> Duration {
        Duration::from_millis(Self::INITIAL_DELAY_MS)
    }

    fn next_delay(current: Duration) -> Duration {
        (current * 2).min(Duration::from_secs(5))
    }
}

/// [`PlayerStore`] backed by one DynamoDB table keyed by username.
#[derive(Clone)]
pub struct DynamoPlayerStore {
    client: Client,
    table: Arc<str>,
}

impl DynamoPlayerStore {
    /// Build a client from the AWS provider chain and make sure the table exists.
    pub async fn connect(config: DynamoConfig) -> DynamoResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint_url) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        let store = Self {
            client: Client::new(&sdk_config),
            table: Arc::from(config.table_name),
        };

        store.ensure_table().await?;
        Ok(store)
    }

    fn table_name(&self) -> String {
        self.table.to_string()
    }

    async fn ensure_table(&self) -> DynamoResult<()> {
        match self
            .client
            .describe_table()
            .table_name(self.table.as_ref())
            .send()
            .await
        {
            Ok(_) => {
                debug!(table = %self.table, "DynamoDB table already exists");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                self.create_table().await
            }
            Err(err) => Err(DynamoDaoError::DescribeTable {
                table: self.table_name(),
                source: err.into(),
            }),
        }
    }

    async fn create_table(&self) -> DynamoResult<()> {
        info!(table = %self.table, "creating DynamoDB table");

        let definition_error = |source| DynamoDaoError::TableDefinition {
            table: self.table_name(),
            source,
        };
        let attribute = AttributeDefinition::builder()
            .attribute_name(USERNAME_ATTR)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(definition_error)?;
        let key = KeySchemaElement::builder()
            .attribute_name(USERNAME_ATTR)
            .key_type(KeyType::Hash)
            .build()
            .map_err(definition_error)?;

        self.client
            .create_table()
            .table_name(self.table.as_ref())
            .attribute_definitions(attribute)
            .key_schema(key)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|err| DynamoDaoError::CreateTable {
                table: self.table_name(),
                source: err.into(),
            })?;

        self.wait_until_active().await
    }

    async fn wait_until_active(&self) -> DynamoResult<()> {
        let mut attempts = 0;
        let mut delay = ActivationPolicy::initial_delay();

        loop {
            attempts += 1;
            let output = self
                .client
                .describe_table()
                .table_name(self.table.as_ref())
                .send()
                .await
                .map_err(|err| DynamoDaoError::DescribeTable {
                    table: self.table_name(),
                    source: err.into(),
                })?;

            let status = output.table.and_then(|table| table.table_status);
            if status == Some(TableStatus::Active) {
                info!(table = %self.table, attempts, "DynamoDB table is active");
                return Ok(());
            }
            if attempts >= ActivationPolicy::MAX_ATTEMPTS {
                return Err(DynamoDaoError::TableNotActive {
                    table: self.table_name(),
                    attempts,
                });
            }
            sleep(delay).await;
            delay = ActivationPolicy::next_delay(delay);
        }
    }

    async fn upsert_player(
        &self,
        username: Username,
        score: Score,
        now: OffsetDateTime,
    ) -> DynamoResult<PlayerEntity> {
        let output = self
            .client
            .update_item()
            .table_name(self.table.as_ref())
            .key(USERNAME_ATTR, username_key(username.as_str()))
            .update_expression(UPSERT_EXPRESSION)
            .expression_attribute_names("#score", SCORE_ATTR)
            .expression_attribute_names("#updated", UPDATED_AT_ATTR)
            .expression_attribute_names("#created", CREATED_AT_ATTR)
            .expression_attribute_values(":score", score_value(score.value()))
            .expression_attribute_values(":now", timestamp_value(now)?)
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| DynamoDaoError::UpsertPlayer {
                username: username.to_string(),
                source: err.into(),
            })?;

        let attributes = output
            .attributes
            .ok_or_else(|| DynamoDaoError::MissingAttributes {
                username: username.to_string(),
            })?;
        player_from_item(&attributes)
    }

    async fn find_player(&self, username: Username) -> DynamoResult<Option<PlayerEntity>> {
        let output = self
            .client
            .get_item()
            .table_name(self.table.as_ref())
            .key(USERNAME_ATTR, username_key(username.as_str()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| DynamoDaoError::LoadPlayer {
                username: username.to_string(),
                source: err.into(),
            })?;

        output.item.as_ref().map(player_from_item).transpose()
    }

    /// DynamoDB cannot order a scan, so every page is read and ranked here.
    /// Only the best `limit` players are held between pages.
    async fn list_top_players(&self, limit: u32) -> DynamoResult<Vec<PlayerEntity>> {
        let mut top = TopPlayers::new(limit);
        let mut start_key = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(self.table.as_ref())
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|err| DynamoDaoError::ScanPlayers {
                    table: self.table_name(),
                    source: err.into(),
                })?;

            for item in page.items() {
                top.push(player_from_item(item)?);
            }
            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(top.into_vec())
    }

    async fn ping(&self) -> DynamoResult<()> {
        self.client
            .describe_table()
            .table_name(self.table.as_ref())
            .send()
            .await
            .map_err(|err| DynamoDaoError::DescribeTable {
                table: self.table_name(),
                source: err.into(),
            })?;
        Ok(())
    }
}

impl PlayerStore for DynamoPlayerStore {
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
