// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the wallet API server:
//! configuration, the cached data service wired to the configured upstream
//! clients, and coordinated cancellation.

use std::sync::Arc;

use data_service::{DataService, Providers};
use external_apis::{
    AlchemyClient, AlchemyConfig, CovalentClient, CovalentConfig, UsersClient, UsersConfig,
};
use serde::{Deserialize, Serialize};
use shared_types::Chain;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::{
    config::{Environment, ServerConfig},
    error::{ServerError, ServerResult},
    metrics::MetricsObserver,
};

/// Data service over the production upstream clients
pub type WalletService = DataService<CovalentClient, AlchemyClient, UsersClient>;

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    config: Arc<ServerConfig>,
    service: Arc<WalletService>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Build the upstream clients and the data service described by `config`
    ///
    /// The service aggregates under a child of `cancellation_token`, so
    /// cancelling it abandons every in-flight fan-out.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` when a provider setting is invalid
    pub fn from_config(
        config: ServerConfig,
        cancellation_token: CancellationToken,
    ) -> ServerResult<Self> {
        let providers = &config.providers;
        let covalent = CovalentConfig::new(
            providers.covalent.base_url.as_str(),
            providers.covalent.api_key.as_str(),
            providers.covalent.timeout_seconds,
        )
        .and_then(CovalentClient::new)
        .map_err(|e| config_error("covalent", &e))?;
        let alchemy = AlchemyConfig::new(
            providers.alchemy.api_key.as_str(),
            providers.alchemy.timeout_seconds,
        )
        .and_then(AlchemyClient::new)
        .map_err(|e| config_error("alchemy", &e))?;
        let users = UsersConfig::new(
            providers.users.endpoint.as_str(),
            providers.users.timeout_seconds,
        )
        .and_then(UsersClient::new)
        .map_err(|e| config_error("users", &e))?;
        let registry = providers
            .chain_registry()
            .map_err(|e| config_error("alchemy", &e))?;

        let service = DataService::new(
            Providers {
                balances: Arc::new(covalent),
                nfts: Arc::new(alchemy),
                users: Arc::new(users),
            },
            Arc::new(registry),
            config.cache.service_config(),
            Arc::new(MetricsObserver::default()),
            cancellation_token.child_token(),
        );

        Ok(Self::new(config, Arc::new(service), cancellation_token))
    }

    /// Create new server state around an existing service
    pub fn new(
        config: ServerConfig,
        service: Arc<WalletService>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config: Arc::new(config),
            service,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The cached data service
    pub fn service(&self) -> &Arc<WalletService> {
        &self.service
    }

    /// Current health of the server
    pub fn health_check(&self) -> HealthCheck {
        let status = if self.cancellation_token.is_cancelled() {
            HealthStatus::Down {
                reason: Box::from("shutting down"),
            }
        } else {
            HealthStatus::Up
        };

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            chains: self.service.registry().chains().to_vec(),
        }
    }
}

fn config_error(provider: &str, error: &dyn std::fmt::Display) -> ServerError {
    ServerError::Config {
        message: format!("invalid {provider} provider configuration: {error}"),
    }
}

/// Health status of the service
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is accepting requests
    Up,

    /// Service is not serving requests
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Chains every wallet view aggregates over
    pub chains: Vec<Chain>,
}
