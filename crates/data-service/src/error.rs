// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for aggregation and cached data access
//!
//! Per-chain failures are not errors at this level: they are recorded as
//! outcomes next to the merged items. What remains is the small set of
//! failures a caller has to handle.

use std::sync::Arc;

use api_client::ApiError;
use thiserror::Error;

use crate::ResourceKind;

/// Result type alias for data service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures of an aggregation as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// The registry holds no chain, so no fan-out target can be resolved
    #[error("no chains configured")]
    NoChainsConfigured,

    /// The caller's cancellation token fired before all chains settled
    #[error("aggregation cancelled")]
    Cancelled,
}

/// Errors surfaced by the data service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The aggregation itself could not run
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// A single-source upstream request failed (the users list)
    #[error("upstream request failed: {0}")]
    Upstream(#[from] ApiError),

    /// A derived resource could not load the resource it is computed from
    #[error("{resource} unavailable: {source}")]
    Dependency {
        /// The resource that failed to load
        resource: ResourceKind,
        /// Why it failed
        source: Arc<ServiceError>,
    },

    /// The operation was abandoned through cancellation
    #[error("operation cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Whether a query hitting this error may be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(error) => error.is_server_side(),
            Self::Aggregation(_) | Self::Dependency { .. } | Self::Cancelled => false,
        }
    }

    /// Whether this error stems from cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Aggregation(AggregationError::Cancelled) | Self::Cancelled => true,
            Self::Dependency { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_retryable_upstream_errors_retry() {
        let server = ServiceError::Upstream(ApiError::Status {
            status: 500,
            message: String::new(),
        });
        assert!(server.is_retryable());

        let client = ServiceError::Upstream(ApiError::Status {
            status: 404,
            message: String::new(),
        });
        assert!(!client.is_retryable());

        let malformed = ServiceError::Upstream(ApiError::Decode {
            message: "expected array".to_string(),
        });
        assert!(!malformed.is_retryable());

        assert!(!ServiceError::from(AggregationError::NoChainsConfigured).is_retryable());
    }

    #[test]
    fn cancellation_is_detected_through_dependencies() {
        let error = ServiceError::Dependency {
            resource: ResourceKind::Tokens,
            source: Arc::new(AggregationError::Cancelled.into()),
        };
        assert!(error.is_cancelled());
        assert_eq!(
            error.to_string(),
            "tokens unavailable: aggregation cancelled"
        );
    }
}
