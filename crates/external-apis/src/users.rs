// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Users list endpoint

use api_client::{ApiError, UpstreamClient, User, UserListProvider};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    http::{HttpFailure, build_client, get_json},
    non_empty_string::NonEmptyString,
};

/// Default users list endpoint
pub const DEFAULT_USERS_ENDPOINT: &str = "https://layer3.xyz/api/assignment/users";
const DEFAULT_USERS_TIMEOUT_SECONDS: u64 = 10;

/// Configuration for the users list client
#[derive(Debug, Clone)]
pub struct UsersConfig {
    /// Full endpoint URL
    pub endpoint: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl UsersConfig {
    /// Create a new `UsersConfig` with validation
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Result<Self, UsersError> {
        let endpoint = NonEmptyString::new(endpoint)
            .map_err(|_| UsersError::Config("endpoint cannot be empty".to_string()))?;
        Url::parse(endpoint.as_str())
            .map_err(|error| UsersError::Config(format!("invalid endpoint: {error}")))?;
        Ok(Self {
            endpoint,
            timeout_seconds: if timeout_seconds == 0 {
                DEFAULT_USERS_TIMEOUT_SECONDS
            } else {
                timeout_seconds
            },
        })
    }
}

/// Errors specific to the users list client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum UsersError {
    /// Request level failure
    #[error(transparent)]
    Request(#[from] HttpFailure),

    /// HTTP client could not be built
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<UsersError> for ApiError {
    fn from(value: UsersError) -> Self {
        match value {
            UsersError::Request(failure) => failure.into(),
            UsersError::Client(error) => ApiError::Configuration {
                message: error.to_string(),
            },
            UsersError::Config(message) => ApiError::Configuration { message },
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    users: Vec<User>,
}

/// Users list client
#[derive(Debug)]
pub struct UsersClient {
    client: Client,
    config: UsersConfig,
}

impl UsersClient {
    /// Create a new users list client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: UsersConfig) -> Result<Self, UsersError> {
        let client = build_client(config.timeout_seconds)?;
        Ok(Self { client, config })
    }
}

impl UpstreamClient for UsersClient {
    fn name(&self) -> &'static str {
        "users"
    }
}

impl UserListProvider for UsersClient {
    async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        debug!(endpoint = self.config.endpoint.as_str(), "fetching users list");
        let request = self.client.get(self.config.endpoint.as_str());
        let response: UsersResponse = get_json(request, self.config.timeout_seconds, self.name())
            .await
            .map_err(UsersError::from)?;
        Ok(response.users)
    }
}
