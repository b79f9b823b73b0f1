//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a default, so an empty
//! environment yields a working local setup against the public
//! BlockCypher API and a `blockchain.db` SQLite file.

use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::domain::ChainName;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is not a socket address.
    #[error("invalid LISTEN_ADDR: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),

    /// `BLOCKCYPHER_BASE_URL` is not an absolute URL.
    #[error("invalid BLOCKCYPHER_BASE_URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// `BLOCKCYPHER_ENDPOINTS` is set but lists nothing.
    #[error("BLOCKCYPHER_ENDPOINTS must list at least one endpoint")]
    NoEndpoints,
}

/// Deployment mode. Development exposes error details in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Error bodies carry `detail` and `stackTrace`.
    Development,
    /// Error bodies carry only the generic message.
    Production,
}

impl Environment {
    /// Parses `APP_ENV`; anything other than `development`/`dev` is
    /// production.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("development") || value.eq_ignore_ascii_case("dev") {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Returns `true` in development mode.
    #[must_use]
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// BlockCypher source settings.
#[derive(Debug, Clone)]
pub struct BlockcypherConfig {
    /// Base URL endpoint paths are resolved against.
    pub base_url: Url,
    /// Ordered endpoint paths, one per supported chain.
    pub endpoints: Vec<String>,
    /// Timeout for each individual endpoint request.
    pub request_timeout: Duration,
    /// Deadline for the whole fan-out.
    pub fetch_timeout: Duration,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`] and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Deployment mode.
    pub environment: Environment,

    /// SQLite connection string.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// BlockCypher source settings.
    pub blockcypher: BlockcypherConfig,

    /// Lifetime of a cached query response.
    pub cache_ttl: Duration,

    /// Maximum number of cached query responses.
    pub cache_max_capacity: u64,

    /// Emit logs as JSON instead of the human-readable format.
    pub log_json: bool,
}

impl BlockcypherConfig {
    /// Returns `true` unless there is exactly one endpoint per supported
    /// chain.
    #[must_use]
    pub fn endpoint_count_unexpected(&self) -> bool {
        self.endpoints.len() != ChainName::ALL.len()
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `LISTEN_ADDR` or
    /// `BLOCKCYPHER_BASE_URL` cannot be parsed, or if
    /// `BLOCKCYPHER_ENDPOINTS` lists no endpoints.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()?;

        let environment = lookup("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Production);

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://blockchain.db?mode=rwc".to_string());
        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5);
        let database_connect_timeout_secs = parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5);

        let base_url = Url::parse(
            &lookup("BLOCKCYPHER_BASE_URL")
                .unwrap_or_else(|| "https://api.blockcypher.com".to_string()),
        )?;

        let endpoints = match lookup("BLOCKCYPHER_ENDPOINTS") {
            Some(raw) => split_endpoints(&raw),
            None => ChainName::ALL
                .iter()
                .map(|chain| chain.endpoint().to_string())
                .collect(),
        };
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "BLOCKCYPHER_REQUEST_TIMEOUT_SECS", 10));
        let fetch_timeout = Duration::from_secs(parse_or(&lookup, "FETCH_TIMEOUT_SECS", 30));

        let cache_ttl = Duration::from_secs(parse_or(&lookup, "CACHE_TTL_SECS", 300));
        let cache_max_capacity = parse_or(&lookup, "CACHE_MAX_CAPACITY", 1_000);

        let log_json = lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            listen_addr,
            environment,
            database_url,
            database_max_connections,
            database_connect_timeout_secs,
            blockcypher: BlockcypherConfig {
                base_url,
                endpoints,
                request_timeout,
                fetch_timeout,
            },
            cache_ttl,
            cache_max_capacity,
            log_json,
        })
    }
}

/// Parses the value under `key` as `T`, returning `default` on missing or
/// invalid values.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Splits a comma-separated endpoint list, dropping blank entries.
fn split_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(ToString::to_string)
        .collect()
}
