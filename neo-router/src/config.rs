use favourites::config::FavouritesStoreType;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Upstream API key cannot be empty")]
    EmptyApiKey,

    #[error("max_concurrent_requests must be at least 1")]
    ZeroConcurrency,

    #[error("{0} cannot be 0")]
    ZeroTimeout(&'static str),
}

/// neo-router configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for the passthrough API
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Deadline for a whole inbound search, including every fanned out call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// The near-earth object API
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub details_cache: DetailsCacheConfig,
    #[serde(default)]
    pub favourites_store: FavouritesStoreType,
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.upstream.validate()?;

        if self.request_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("request_timeout_secs"));
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Upstream API configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Base URL of the API, e.g. `https://api.nasa.gov/`
    pub url: Url,
    pub api_key: String,
    /// Timeout for a single upstream call, including reading the body
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on concurrent upstream calls made for one inbound request
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    4
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("upstream.timeout_secs"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Cache for asteroid detail lookups
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetailsCacheConfig {
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for DetailsCacheConfig {
    fn default() -> Self {
        DetailsCacheConfig {
            ttl_secs: 300,
            max_entries: 1000,
        }
    }
}
