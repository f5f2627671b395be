// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet API configuration
//!
//! This module provides configuration structures and logic for the wallet API
//! server: listener settings validated per environment, upstream provider
//! credentials, and the freshness and retry settings of the data caches.

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
    time::Duration,
};

use anyhow::{Context, Result, anyhow, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use data_service::{RetryPolicy, ServiceConfig};
use external_apis::{DEFAULT_COVALENT_BASE_URL, DEFAULT_USERS_ENDPOINT};
use serde::{Deserialize, Deserializer, Serialize, de};
use shared_types::{ChainId, ChainRegistry};
use utoipa::ToSchema;

use crate::error::{ServerError, ServerResult};

const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_USERS_TIMEOUT_SECONDS: u64 = 10;

/// Listening port; 0 (OS-assigned) is reserved for tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Port checked against `environment`
    ///
    /// # Errors
    ///
    /// Fails for port 0 outside [`Environment::Testing`]
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port 0 is only allowed in the testing environment"));
        }
        Ok(Self { port, environment })
    }

    /// Default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Port 0, letting the OS pick one
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // validated against the environment once the whole config is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// Per-request timeout, between 1 and 300 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// # Errors
    ///
    /// Fails outside `1..=300`
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!((1..=300).contains(&seconds), "request timeout must be within 1..=300 seconds, got {seconds}");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Default request timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Shorter timeout used by tests
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Covalent settings (token balances and transactions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CovalentSettings {
    /// API base URL
    pub base_url: String,
    /// API key
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for CovalentSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COVALENT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECONDS,
        }
    }
}

/// Alchemy settings (owned NFTs)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlchemySettings {
    /// API key
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// NFT base URL overrides, keyed by chain id or chain name
    pub base_urls: HashMap<String, String>,
}

impl Default for AlchemySettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECONDS,
            base_urls: HashMap::new(),
        }
    }
}

/// Users list settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersSettings {
    /// Full endpoint URL
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for UsersSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_USERS_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_USERS_TIMEOUT_SECONDS,
        }
    }
}

/// Upstream providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Balances and transactions provider
    pub covalent: CovalentSettings,
    /// NFT provider
    pub alchemy: AlchemySettings,
    /// Users list provider
    pub users: UsersSettings,
}

impl ProvidersConfig {
    /// Built-in chain registry with the configured NFT base URL overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error when an override names an unknown chain
    pub fn chain_registry(&self) -> Result<ChainRegistry> {
        let mut overrides = self
            .alchemy
            .base_urls
            .iter()
            .map(|(chain, url)| {
                ChainId::from_str(chain)
                    .map(|id| (id, url.clone()))
                    .with_context(|| format!("invalid NFT base URL override for '{chain}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        overrides.sort_by_key(|(id, _)| *id);

        Ok(overrides
            .into_iter()
            .fold(ChainRegistry::default(), |registry, (id, url)| {
                registry.with_nft_base_url(id, url)
            }))
    }
}

/// Freshness, garbage collection and retry settings of the data caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Token balances freshness window
    pub tokens_freshness_seconds: u64,
    /// Collectibles freshness window
    pub collectibles_freshness_seconds: u64,
    /// Transactions freshness window
    pub transactions_freshness_seconds: u64,
    /// Users list freshness window
    pub users_freshness_seconds: u64,
    /// Multichain balance freshness window
    pub balance_freshness_seconds: u64,
    /// Entries not read for this long are removed
    pub gc_seconds: u64,
    /// Period of the background sweep
    pub sweep_interval_seconds: u64,
    /// Retries after a failed fetch
    pub max_retries: usize,
    /// First retry delay
    pub retry_base_delay_ms: u64,
    /// Upper bound of the retry delay
    pub retry_max_delay_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            tokens_freshness_seconds: 120,
            collectibles_freshness_seconds: 300,
            transactions_freshness_seconds: 60,
            users_freshness_seconds: 300,
            balance_freshness_seconds: 120,
            gc_seconds: 600,
            sweep_interval_seconds: 60,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 30_000,
        }
    }
}

impl CacheSettings {
    /// Data service configuration described by these settings
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            tokens_freshness: Duration::from_secs(self.tokens_freshness_seconds),
            collectibles_freshness: Duration::from_secs(self.collectibles_freshness_seconds),
            transactions_freshness: Duration::from_secs(self.transactions_freshness_seconds),
            users_freshness: Duration::from_secs(self.users_freshness_seconds),
            balance_freshness: Duration::from_secs(self.balance_freshness_seconds),
            gc_after: Duration::from_secs(self.gc_seconds),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
                max_delay: Duration::from_millis(self.retry_max_delay_ms),
            },
        }
    }

    /// Period of the background sweep, never zero
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

/// Complete wallet API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on
    pub host: IpAddr,
    /// Listening port
    pub port: ServerPort,
    /// Timeout applied to every HTTP request
    pub timeout_seconds: TimeoutSeconds,
    /// Deployment environment
    pub environment: Environment,
    /// Upstream providers
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Data caches
    #[serde(default)]
    pub cache: CacheSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            providers: ProvidersConfig::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl ServerConfig {
    /// [`Self::load`] with the failure mapped to [`ServerError::Config`]
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` when any source is unreadable or invalid
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Layered configuration, later layers winning:
    /// 1. built-in defaults
    /// 2. `config.json`
    /// 3. `config.{ENVIRONMENT}.json`
    /// 4. environment variables with the `SERVER__` prefix, `__` separating nested keys
    ///    (`SERVER__PROVIDERS__COVALENT__API_KEY`)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a source cannot be read or deserialized
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        Ok(server_config)
    }

    /// Configuration for tests: OS-chosen port, placeholder credentials
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            providers: ProvidersConfig {
                covalent: CovalentSettings {
                    api_key: "test-covalent-key".to_string(),
                    ..CovalentSettings::default()
                },
                alchemy: AlchemySettings {
                    api_key: "test-alchemy-key".to_string(),
                    ..AlchemySettings::default()
                },
                users: UsersSettings::default(),
            },
            cache: CacheSettings {
                retry_base_delay_ms: 0,
                retry_max_delay_ms: 0,
                ..CacheSettings::default()
            },
        }
    }

    /// Address the listener binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}
