// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the error types for server operations and their
//! mapping onto HTTP responses.

use std::{net::SocketAddr, sync::Arc};

use api_client::ApiError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use data_service::{AggregationError, ServiceError};
use thiserror::Error;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A cached query failed and no previous value exists
    #[error(transparent)]
    Service(Arc<ServiceError>),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status returned for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Service(error) => service_status(error),
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::TaskJoin { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Status for a data service failure: upstream faults are a bad gateway,
/// cancellation means the server is going away
pub(crate) fn service_status(error: &ServiceError) -> StatusCode {
    if error.is_cancelled() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match error {
        ServiceError::Upstream(ApiError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
        ServiceError::Dependency { source, .. } => service_status(source),
        ServiceError::Aggregation(AggregationError::NoChainsConfigured) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ServiceError::Aggregation(AggregationError::Cancelled) | ServiceError::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

impl From<Arc<ServiceError>> for ServerError {
    fn from(error: Arc<ServiceError>) -> Self {
        Self::Service(error)
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}
