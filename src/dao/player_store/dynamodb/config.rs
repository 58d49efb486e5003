/// Table used when no override is configured.
pub const DEFAULT_TABLE_NAME: &str = "Players";

/// Runtime configuration describing how to reach the DynamoDB players table.
///
/// Credentials are not part of the configuration: they come from the default
/// AWS provider chain (environment, profile, instance metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoConfig {
    /// Players table, created when missing.
    pub table_name: String,
    /// Region override.
    pub region: Option<String>,
    /// Endpoint override, for DynamoDB Local.
    pub endpoint_url: Option<String>,
}

impl DynamoConfig {
    /// Construct a configuration for the given table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            region: None,
            endpoint_url: None,
        }
    }

    /// Pin the AWS region instead of relying on the provider chain.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Point the client at a non-AWS endpoint, such as DynamoDB Local.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_NAME)
    }
}
