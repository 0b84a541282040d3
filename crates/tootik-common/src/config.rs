//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Text-protocol listener configuration (Gemini/Gopher/Finger bind
    /// addresses; the listeners themselves are an external collaborator).
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Response cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Federation identity configuration.
    pub federation: FederationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Public domain of this instance, used to build actor/note ids.
    pub domain: String,
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind the Gemini listener to.
    #[serde(default = "default_gemini_port")]
    pub gemini_port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL for the shared persistent store.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for a cached route, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum time to wait for a single-flight refresh before falling back
    /// to the stale cached bytes.
    #[serde(default = "default_cache_update_timeout_secs")]
    pub update_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            update_timeout_secs: default_cache_update_timeout_secs(),
        }
    }
}

/// Federation identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FederationConfig {
    /// Whether outbound federation delivery is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Instance display name.
    pub instance_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_gemini_port() -> u16 {
    1965
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_cache_ttl_secs() -> u64 {
    15 * 60
}

const fn default_cache_update_timeout_secs() -> u64 {
    5
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `TOOTIK_ENV`)
    /// 3. Environment variables with a `TOOTIK_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("TOOTIK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TOOTIK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TOOTIK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
