//! Application-level configuration, read once from the process environment at startup.

use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::warn;

#[cfg(feature = "dynamo-store")]
use crate::dao::player_store::dynamodb::DynamoConfig;
#[cfg(feature = "postgres-store")]
use crate::dao::player_store::postgres::PostgresConfig;

const PORT_ENV: &str = "PORT";
const SERVER_PORT_ENV: &str = "SERVER_PORT";
const APP_ENV: &str = "APP_ENV";
const NODE_ENV: &str = "NODE_ENV";
const STORE_BACKEND_ENV: &str = "STORE_BACKEND";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const PG_MAX_CONNECTIONS_ENV: &str = "PG_MAX_CONNECTIONS";
const DYNAMO_TABLE_ENV: &str = "DYNAMO_TABLE";
const AWS_REGION_ENV: &str = "AWS_REGION";
const DYNAMO_ENDPOINT_ENV: &str = "DYNAMO_ENDPOINT";
const RATE_LIMIT_MAX_ENV: &str = "RATE_LIMIT_MAX";
const RATE_LIMIT_WINDOW_ENV: &str = "RATE_LIMIT_WINDOW_SECS";
const CLIENT_DIR_ENV: &str = "CLIENT_DIR";
const CORS_ORIGINS_ENV: &str = "CORS_ORIGINS";
const TRUST_PROXY_ENV: &str = "TRUST_PROXY";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CLIENT_DIR: &str = "client";
/// Origins allowed by CORS outside production.
const DEVELOPMENT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
];

/// Errors that prevent the configuration from being built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `STORE_BACKEND` names no known backend.
    #[error("unknown storage backend `{0}` (expected dynamodb, postgres or memory)")]
    UnknownBackend(String),
    /// The selected backend's cargo feature is off.
    #[error("storage backend `{backend}` is not compiled into this binary")]
    BackendDisabled {
        /// Backend name.
        backend: &'static str,
    },
    /// A variable the selected backend needs is unset or blank.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
}

/// Deployment flavour, controlling error verbosity and CORS defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Error details are returned to clients.
    #[default]
    Development,
    /// Generic error bodies and configured CORS origins only.
    Production,
}

impl Environment {
    /// Whether error details must be hidden from clients.
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    /// Name used in logs and the health payload.
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Amazon DynamoDB table.
    #[cfg(feature = "dynamo-store")]
    Dynamo(DynamoConfig),
    /// PostgreSQL database.
    #[cfg(feature = "postgres-store")]
    Postgres(PostgresConfig),
    /// Process-local map, lost on restart.
    Memory,
}

impl StoreConfig {
    /// Short backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "dynamo-store")]
            StoreConfig::Dynamo(_) => "dynamodb",
            #[cfg(feature = "postgres-store")]
            StoreConfig::Postgres(_) => "postgres",
            StoreConfig::Memory => "memory",
        }
    }
}

/// Fixed-window rate limiting applied per client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests a client may make per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port the server listens on.
    pub port: u16,
    /// Deployment flavour.
    pub environment: Environment,
    /// Selected storage backend.
    pub store: StoreConfig,
    /// Per-client request budget.
    pub rate_limit: RateLimitConfig,
    /// Directory served at the root.
    pub client_dir: PathBuf,
    /// Extra origins accepted by CORS; the only ones accepted in production.
    pub cors_origins: Vec<String>,
    /// Key rate limiting on `X-Forwarded-For` / `X-Real-IP` instead of the
    /// socket peer. Only safe behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup(PORT_ENV)
            .map(|raw| (PORT_ENV, raw))
            .or_else(|| lookup(SERVER_PORT_ENV).map(|raw| (SERVER_PORT_ENV, raw)))
            .map(|(var, raw)| parse_value(var, &raw, DEFAULT_PORT))
            .unwrap_or(DEFAULT_PORT);

        let environment = lookup(APP_ENV)
            .or_else(|| lookup(NODE_ENV))
            .map(|name| Environment::from_name(&name))
            .unwrap_or_default();

        let defaults = RateLimitConfig::default();
        let max_requests = parse_var(&lookup, RATE_LIMIT_MAX_ENV, defaults.max_requests);
        let max_requests = if max_requests == 0 {
            warn!(
                var = RATE_LIMIT_MAX_ENV,
                "rate limit must allow at least one request; using default"
            );
            defaults.max_requests
        } else {
            max_requests
        };
        let window_secs = parse_var(&lookup, RATE_LIMIT_WINDOW_ENV, defaults.window.as_secs());
        let rate_limit = RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs.max(1)),
        };

        let client_dir = lookup(CLIENT_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_DIR));

        let cors_origins = lookup(CORS_ORIGINS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let trust_proxy = lookup(TRUST_PROXY_ENV)
            .map(|raw| parse_flag(TRUST_PROXY_ENV, &raw))
            .unwrap_or(false);

        Ok(Self {
            port,
            environment,
            store: store_config(&lookup)?,
            rate_limit,
            client_dir,
            cors_origins,
            trust_proxy,
        })
    }

    /// Origins accepted by the CORS layer.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = Vec::new();
        if !self.environment.is_production() {
            origins.extend(DEVELOPMENT_ORIGINS.iter().map(|origin| origin.to_string()));
        }
        origins.extend(self.cors_origins.iter().cloned());
        origins
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: Environment::default(),
            store: StoreConfig::Memory,
            rate_limit: RateLimitConfig::default(),
            client_dir: PathBuf::from(DEFAULT_CLIENT_DIR),
            cors_origins: Vec::new(),
            trust_proxy: false,
        }
    }
}

/// Pick the backend: an explicit `STORE_BACKEND` wins, otherwise the presence
/// of `DATABASE_URL` selects PostgreSQL and DynamoDB is the fallback.
fn store_config<F>(lookup: &F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let backend = lookup(STORE_BACKEND_ENV)
        .map(|raw| raw.trim().to_ascii_lowercase())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| {
            if lookup(DATABASE_URL_ENV).is_some() {
                "postgres".into()
            } else {
                "dynamodb".into()
            }
        });

    match backend.as_str() {
        "dynamodb" | "dynamo" => dynamo_config(lookup),
        "postgres" | "postgresql" => postgres_config(lookup),
        "memory" => Ok(StoreConfig::Memory),
        _ => Err(ConfigError::UnknownBackend(backend)),
    }
}

#[cfg(feature = "dynamo-store")]
fn dynamo_config<F>(lookup: &F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(DYNAMO_TABLE_ENV).filter(|table| !table.trim().is_empty()) {
        Some(table) => DynamoConfig::new(table.trim()),
        None => DynamoConfig::default(),
    };
    if let Some(region) = lookup(AWS_REGION_ENV).filter(|region| !region.trim().is_empty()) {
        config = config.with_region(region.trim());
    }
    if let Some(endpoint) = lookup(DYNAMO_ENDPOINT_ENV).filter(|url| !url.trim().is_empty()) {
        config = config.with_endpoint_url(endpoint.trim());
    }
    Ok(StoreConfig::Dynamo(config))
}

#[cfg(not(feature = "dynamo-store"))]
fn dynamo_config<F>(_lookup: &F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Err(ConfigError::BackendDisabled {
        backend: "dynamodb",
    })
}

#[cfg(feature = "postgres-store")]
fn postgres_config<F>(lookup: &F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let url = lookup(DATABASE_URL_ENV)
        .filter(|url| !url.trim().is_empty())
        .ok_or(ConfigError::MissingEnvVar {
            var: DATABASE_URL_ENV,
        })?;
    let defaults = PostgresConfig::new(url);
    let max_connections = parse_var(lookup, PG_MAX_CONNECTIONS_ENV, defaults.max_connections);
    Ok(StoreConfig::Postgres(
        defaults.with_max_connections(max_connections.max(1)),
    ))
}

#[cfg(not(feature = "postgres-store"))]
fn postgres_config<F>(_lookup: &F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Err(ConfigError::BackendDisabled {
        backend: "postgres",
    })
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        Some(raw) => parse_value(var, &raw, default),
        None => default,
    }
}

fn parse_value<T>(var: &'static str, raw: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(err) => {
            warn!(var, value = raw, error = %err, "invalid configuration value; using default");
            default
        }
    }
}

fn parse_flag(var: &'static str, raw: &str) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "" | "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(var, value = raw, "invalid boolean flag; using false");
            false
        }
    }
}
