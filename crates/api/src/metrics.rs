// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros,
//! the [`MetricsObserver`] that feeds them from the data service, and an
//! Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use data_service::{CacheOperation, ChainOutcome, OutcomeObserver, ResourceKind, TracingObserver};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};

/// Per-chain upstream calls, labeled by resource, chain and result
pub static CHAIN_FETCHES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "wallet_api_chain_fetch_total",
        "Total number of per-chain upstream calls",
        &["resource", "chain", "result"]
    )
    .expect("Failed to create wallet_api_chain_fetch_total counter vec")
});

/// Duration of per-chain upstream calls in seconds
pub static CHAIN_FETCH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "wallet_api_chain_fetch_duration_seconds",
        "Per-chain upstream call durations in seconds",
        &["resource", "chain", "result"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create chain fetch duration histogram")
});

/// Cache operations, labeled by operation and resource
pub static CACHE_OPERATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "wallet_api_cache_operations_total",
        "Total number of cache operations",
        &["operation", "resource"]
    )
    .expect("Failed to create cache operations counter vec")
});

/// Record one settled per-chain call
pub fn record_chain_fetch(resource: ResourceKind, chain: &str, success: bool, duration_secs: f64) {
    let result = if success { "success" } else { "failure" };
    CHAIN_FETCHES
        .with_label_values(&[resource.as_str(), chain, result])
        .inc();
    CHAIN_FETCH_DURATION
        .with_label_values(&[resource.as_str(), chain, result])
        .observe(duration_secs);
}

/// Record a cache operation
pub fn record_cache_operation(operation: CacheOperation, resource: ResourceKind) {
    CACHE_OPERATIONS
        .with_label_values(&[operation.as_str(), resource.as_str()])
        .inc();
}

/// Observer publishing outcomes as Prometheus metrics, and logging them
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver {
    tracing: TracingObserver,
}

impl OutcomeObserver for MetricsObserver {
    fn chain_outcome(&self, outcome: &ChainOutcome) {
        self.tracing.chain_outcome(outcome);
        record_chain_fetch(
            outcome.resource,
            &outcome.chain_name,
            outcome.is_ok(),
            outcome.elapsed.as_secs_f64(),
        );
    }

    fn cache_operation(&self, resource: ResourceKind, operation: CacheOperation) {
        self.tracing.cache_operation(resource, operation);
        record_cache_operation(operation, resource);
    }
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(error) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(%error, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    match String::from_utf8(buffer) {
        Ok(body) => ([(header::CONTENT_TYPE, encoder.format_type().to_string())], body).into_response(),
        Err(error) => {
            tracing::error!(%error, "metrics buffer is not valid UTF-8");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
