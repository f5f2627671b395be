// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request execution shared by the upstream clients

use std::time::Duration;

use api_client::ApiError;
use reqwest::{Client, RequestBuilder, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("wallet-data/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RETRY_AFTER_SECONDS: u64 = 60;
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Failure of a single upstream request
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum HttpFailure {
    /// Request could not be sent or the body could not be read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No response within the configured timeout
    #[error("request timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Credentials rejected
    #[error("authentication failed with status {status}")]
    Unauthorized { status: u16 },

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimited { retry_after_seconds: u64 },

    /// Any other non-success status
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Body is not the expected JSON
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<HttpFailure> for ApiError {
    fn from(value: HttpFailure) -> Self {
        match value {
            HttpFailure::Http(error) if error.is_decode() => ApiError::Decode {
                message: error.to_string(),
            },
            HttpFailure::Http(error) => ApiError::Transport {
                message: error.to_string(),
            },
            HttpFailure::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
            failure @ HttpFailure::Unauthorized { .. } => ApiError::Authentication {
                message: failure.to_string(),
            },
            HttpFailure::RateLimited {
                retry_after_seconds,
            } => ApiError::RateLimitExceeded {
                retry_after_seconds,
            },
            HttpFailure::Status { status, message } => ApiError::Status { status, message },
            HttpFailure::Json(error) => ApiError::Decode {
                message: error.to_string(),
            },
        }
    }
}

/// Build the HTTP client used by every provider
pub(crate) fn build_client(timeout_seconds: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
}

/// Send `request` and decode a successful JSON body into `T`
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    timeout_seconds: u64,
    provider: &'static str,
) -> Result<T, HttpFailure> {
    let response = timeout(
        Duration::from_secs(timeout_seconds),
        request.header("accept", "application/json").send(),
    )
    .await
    .map_err(|_| HttpFailure::Timeout {
        seconds: timeout_seconds,
    })?
    .map_err(|error| classify(error, timeout_seconds))?;

    match response.status() {
        status if status.is_success() => {
            let body = response
                .bytes()
                .await
                .map_err(|error| classify(error, timeout_seconds))?;
            Ok(serde_json::from_slice(&body)?)
        }
        status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            Err(HttpFailure::Unauthorized {
                status: status.as_u16(),
            })
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_seconds = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECONDS);
            Err(HttpFailure::RateLimited {
                retry_after_seconds,
            })
        }
        status => {
            let message: String = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string())
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            warn!(
                provider,
                status = status.as_u16(),
                body = %message,
                "upstream error response"
            );
            Err(HttpFailure::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Decode every list element on its own; elements not matching `T` are dropped
pub(crate) fn decode_each<T: DeserializeOwned>(
    items: Vec<Value>,
    provider: &'static str,
) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| {
            serde_json::from_value(item)
                .inspect_err(|error| debug!(provider, %error, "dropping undecodable list item"))
                .ok()
        })
        .collect()
}

fn classify(error: reqwest::Error, timeout_seconds: u64) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::Timeout {
            seconds: timeout_seconds,
        }
    } else {
        HttpFailure::Http(error)
    }
}
