// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` documentation module
//!
//! This module provides the `OpenAPI` specification and a `Swagger UI` page.

use api_client::{
    ChainBalance, Collectible, Direction, ExplorerRef, MultichainBalance, Token, Transaction, User,
};
use axum::{Json, response::Html};
use data_service::{CacheStats, ServiceCacheStats};
use shared_types::Chain;
use utoipa::OpenApi;

use crate::{
    config::Environment,
    routes::handlers::{
        self, CachedResponse, ChainFetchStatus, RefreshOutcome, RefreshResponse, ResourceResponse,
        WalletPart, WalletResponse,
    },
    state::{HealthCheck, HealthStatus},
};

/// `OpenAPI` document of the wallet API
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Wallet API",
        description = "Token balances, collectibles and transactions of a wallet, aggregated across chains"
    ),
    paths(
        handlers::health_handler,
        handlers::users_handler,
        handlers::wallet_handler,
        handlers::tokens_handler,
        handlers::collectibles_handler,
        handlers::transactions_handler,
        handlers::balance_handler,
        handlers::refresh_handler,
        handlers::cache_stats_handler,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        Environment,
        Chain,
        Token,
        Collectible,
        Transaction,
        Direction,
        ExplorerRef,
        User,
        MultichainBalance,
        ChainBalance,
        ChainFetchStatus,
        ResourceResponse<Token>,
        ResourceResponse<Collectible>,
        ResourceResponse<Transaction>,
        CachedResponse<MultichainBalance>,
        CachedResponse<Vec<User>>,
        WalletPart<ResourceResponse<Token>>,
        WalletResponse,
        RefreshOutcome,
        RefreshResponse,
        CacheStats,
        ServiceCacheStats,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Users list"),
        (name = "wallets", description = "Per-wallet multichain data"),
        (name = "cache", description = "Cache introspection")
    )
)]
pub struct ApiDoc;

/// `OpenAPI` specification endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI endpoint
pub async fn swagger_ui() -> Html<&'static str> {
    Html(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Wallet API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({ url: '/api-doc/openapi.json', dom_id: '#swagger-ui', deepLinking: true });
        }
    </script>
</body>
</html>
"#,
    )
}
