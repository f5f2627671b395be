// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration for the wallet API server.

pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{
    balance_handler, cache_stats_handler, collectibles_handler, health_handler, refresh_handler,
    tokens_handler, transactions_handler, users_handler, wallet_handler,
};

use crate::{
    metrics::metrics_handler,
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    let ops_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let wallet_routes = Router::new()
        .route("/{address}", get(wallet_handler))
        .route("/{address}/tokens", get(tokens_handler))
        .route("/{address}/collectibles", get(collectibles_handler))
        .route("/{address}/transactions", get(transactions_handler))
        .route("/{address}/balance", get(balance_handler))
        .route("/{address}/refresh", post(refresh_handler));

    let api_routes = Router::new()
        .route("/users", get(users_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .nest("/wallets", wallet_routes);

    Router::new()
        .merge(ops_routes)
        .merge(docs_routes)
        .nest("/v1", api_routes)
}
