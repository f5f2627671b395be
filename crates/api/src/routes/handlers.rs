// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Every wallet resource is served from the data service cache. When a
//! background refresh failed, the previous value is returned with `stale`
//! set and the failure in `error`; only a failed first load is an HTTP error.

use std::{sync::Arc, time::Duration};

use api_client::{Collectible, MultichainBalance, Token, Transaction, User};
use axum::{Json, extract::State, response::IntoResponse};
use data_service::{Aggregated, CacheRead, ChainOutcome, ServiceCacheStats, ServiceError, Slot};
use serde::Serialize;
use shared_types::ChainId;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::ServerResult,
    extractors::WalletAddress,
    state::{HealthCheck, ServerState},
};

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn describe(error: Option<&Arc<ServiceError>>) -> Option<String> {
    error.map(ToString::to_string)
}

/// Result of one chain within an aggregated resource
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainFetchStatus {
    /// Chain queried
    #[schema(value_type = u64, example = 1)]
    pub chain_id: ChainId,
    /// Chain display name
    pub chain_name: String,
    /// Items the chain contributed before filtering, absent when it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<usize>,
    /// Why the chain contributed nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time the upstream call took
    pub elapsed_ms: u64,
}

impl From<&ChainOutcome> for ChainFetchStatus {
    fn from(outcome: &ChainOutcome) -> Self {
        Self {
            chain_id: outcome.chain_id,
            chain_name: outcome.chain_name.clone(),
            items: outcome.result.as_ref().ok().copied(),
            error: outcome.result.as_ref().err().map(ToString::to_string),
            elapsed_ms: millis(outcome.elapsed),
        }
    }
}

/// Aggregated wallet resource as served from the cache
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse<T> {
    /// Merged items across every chain
    pub items: Vec<T>,
    /// Per-chain results of the fan-out that produced `items`
    pub chains: Vec<ChainFetchStatus>,
    /// Whether `items` is older than its freshness window
    pub stale: bool,
    /// Failure of the latest background refresh, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Age of `items`
    pub age_ms: u64,
}

impl<T: Clone> From<&CacheRead<Aggregated<T>>> for ResourceResponse<T> {
    fn from(read: &CacheRead<Aggregated<T>>) -> Self {
        Self {
            items: read.value.items.clone(),
            chains: read.value.outcomes.iter().map(ChainFetchStatus::from).collect(),
            stale: read.stale,
            error: describe(read.error.as_ref()),
            age_ms: millis(read.age),
        }
    }
}

/// Single cached value
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse<T> {
    /// The cached value
    pub data: T,
    /// Whether `data` is older than its freshness window
    pub stale: bool,
    /// Failure of the latest background refresh, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Age of `data`
    pub age_ms: u64,
}

impl<T: Clone> From<&CacheRead<T>> for CachedResponse<T> {
    fn from(read: &CacheRead<T>) -> Self {
        Self {
            data: T::clone(&read.value),
            stale: read.stale,
            error: describe(read.error.as_ref()),
            age_ms: millis(read.age),
        }
    }
}

/// One independently loaded part of a wallet snapshot
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletPart<T> {
    /// The part, absent when it failed to load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Why the part failed to load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> WalletPart<T> {
    fn from_slot<'a, V>(slot: &'a Slot<V>, convert: impl FnOnce(&'a CacheRead<V>) -> T) -> Self {
        match slot {
            Ok(read) => Self {
                data: Some(convert(read)),
                error: None,
            },
            Err(error) => Self {
                data: None,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Everything shown for one wallet
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    /// Wallet address
    #[schema(example = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")]
    pub address: String,
    /// Token balances
    pub tokens: WalletPart<ResourceResponse<Token>>,
    /// Owned NFTs
    pub collectibles: WalletPart<ResourceResponse<Collectible>>,
    /// Recent transactions
    pub transactions: WalletPart<ResourceResponse<Transaction>>,
    /// Multichain balance, absent while the wallet holds no tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<WalletPart<CachedResponse<MultichainBalance>>>,
}

/// Outcome of refreshing one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RefreshOutcome {
    /// Whether the resource was replaced
    pub refreshed: bool,
    /// Why the refresh failed; the previous value is kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Result<(), Arc<ServiceError>>> for RefreshOutcome {
    fn from(result: &Result<(), Arc<ServiceError>>) -> Self {
        Self {
            refreshed: result.is_ok(),
            error: result.as_ref().err().map(ToString::to_string),
        }
    }
}

/// Per-resource outcome of a manual refresh
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// Token balances
    pub tokens: RefreshOutcome,
    /// Owned NFTs
    pub collectibles: RefreshOutcome,
    /// Transactions
    pub transactions: RefreshOutcome,
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the health status of the service with its version, environment and the chains it aggregates over.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.health_check())
}

/// Users list
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "users",
    summary = "Users list sorted by rank",
    responses(
        (status = 200, description = "Users list", body = CachedResponse<Vec<User>>),
        (status = 502, description = "Users provider failed and nothing is cached", body = String),
        (status = 503, description = "Server is shutting down", body = String)
    )
)]
pub async fn users_handler(
    State(state): State<ServerState>,
) -> ServerResult<Json<CachedResponse<Vec<User>>>> {
    let read = state.service().fetch_users().await?;
    Ok(Json(CachedResponse::from(&read)))
}

/// Token balances of a wallet
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/tokens",
    tag = "wallets",
    summary = "Token balances across every chain",
    description = "Tokens with a positive balance and quote, merged across chains, sorted by quote value descending. A failing chain contributes no tokens and is reported in `chains`.",
    params(("address" = String, Path, description = "Wallet address, 0x-prefixed hex")),
    responses(
        (status = 200, description = "Token balances", body = ResourceResponse<Token>),
        (status = 400, description = "Malformed address", body = String),
        (status = 503, description = "Server is shutting down", body = String)
    )
)]
pub async fn tokens_handler(
    State(state): State<ServerState>,
    WalletAddress(address): WalletAddress,
) -> ServerResult<Json<ResourceResponse<Token>>> {
    let read = state.service().fetch_tokens(address).await?;
    Ok(Json(ResourceResponse::from(&read)))
}

/// NFTs owned by a wallet
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/collectibles",
    tag = "wallets",
    summary = "Owned NFTs across chains with an NFT provider",
    description = "NFTs with an image, sorted by chain name then item name.",
    params(("address" = String, Path, description = "Wallet address, 0x-prefixed hex")),
    responses(
        (status = 200, description = "Owned NFTs", body = ResourceResponse<Collectible>),
        (status = 400, description = "Malformed address", body = String),
        (status = 503, description = "Server is shutting down", body = String)
    )
)]
pub async fn collectibles_handler(
    State(state): State<ServerState>,
    WalletAddress(address): WalletAddress,
) -> ServerResult<Json<ResourceResponse<Collectible>>> {
    let read = state.service().fetch_collectibles(address).await?;
    Ok(Json(ResourceResponse::from(&read)))
}

/// Recent transactions of a wallet
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/transactions",
    tag = "wallets",
    summary = "Most recent transactions across every chain",
    description = "At most 50 transactions, newest first.",
    params(("address" = String, Path, description = "Wallet address, 0x-prefixed hex")),
    responses(
        (status = 200, description = "Transactions", body = ResourceResponse<Transaction>),
        (status = 400, description = "Malformed address", body = String),
        (status = 503, description = "Server is shutting down", body = String)
    )
)]
pub async fn transactions_handler(
    State(state): State<ServerState>,
    WalletAddress(address): WalletAddress,
) -> ServerResult<Json<ResourceResponse<Transaction>>> {
    let read = state.service().fetch_transactions(address).await?;
    Ok(Json(ResourceResponse::from(&read)))
}

/// Multichain balance of a wallet
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/balance",
    tag = "wallets",
    summary = "Cross-chain balance summary",
    description = "Total value, value 24 hours ago, percent change and the per-chain breakdown, derived from the cached token balances.",
    params(("address" = String, Path, description = "Wallet address, 0x-prefixed hex")),
    responses(
        (status = 200, description = "Balance summary", body = CachedResponse<MultichainBalance>),
        (status = 400, description = "Malformed address", body = String),
        (status = 503, description = "Server is shutting down", body = String)
    )
)]
pub async fn balance_handler(
    State(state): State<ServerState>,
    WalletAddress(address): WalletAddress,
) -> ServerResult<Json<CachedResponse<MultichainBalance>>> {
    let read = state.service().fetch_multichain_balance(address).await?;
    Ok(Json(CachedResponse::from(&read)))
}

/// Everything shown for a wallet
#[utoipa::path(
    get,
    path = "/v1/wallets/{address}",
    tag = "wallets",
    summary = "Wallet snapshot",
    description = "Tokens, collectibles, transactions and balance loaded concurrently. Each part carries its own data or error.",
    params(("address" = String, Path, description = "Wallet address, 0x-prefixed hex")),
    responses(
        (status = 200, description = "Wallet snapshot", body = WalletResponse),
        (status = 400, description = "Malformed address", body = String)
    )
)]
pub async fn wallet_handler(
    State(state): State<ServerState>,
    WalletAddress(address): WalletAddress,
) -> Json<WalletResponse> {
    let snapshot = state.service().fetch_user_data(address).await;
    Json(WalletResponse {
        address: address.to_checksum(None),
        tokens: WalletPart::from_slot(&snapshot.tokens, ResourceResponse::from),
        collectibles: WalletPart::from_slot(&snapshot.collectibles, ResourceResponse::from),
        transactions: WalletPart::from_slot(&snapshot.transactions, ResourceResponse::from),
        balance: snapshot
            .balance
            .as_ref()
            .map(|slot| WalletPart::from_slot(slot, CachedResponse::from)),
    })
}

/// Refetch every resource of a wallet
#[utoipa::path(
    post,
    path = "/v1/wallets/{address}/refresh",
    tag = "wallets",
    summary = "Refresh tokens, collectibles and transactions",
    description = "Bypasses freshness and refetches the three resources concurrently. A failed refresh keeps the previous value and is reported per resource.",
    params(("address" = String, Path, description = "Wallet address, 0x-prefixed hex")),
    responses(
        (status = 200, description = "Per-resource refresh outcome", body = RefreshResponse),
        (status = 400, description = "Malformed address", body = String)
    )
)]
pub async fn refresh_handler(
    State(state): State<ServerState>,
    WalletAddress(address): WalletAddress,
) -> Json<RefreshResponse> {
    info!(%address, "manual refresh requested");
    let report = state.service().refetch_all(address).await;
    Json(RefreshResponse {
        tokens: RefreshOutcome::from(&report.tokens),
        collectibles: RefreshOutcome::from(&report.collectibles),
        transactions: RefreshOutcome::from(&report.transactions),
    })
}

/// Cache statistics
#[utoipa::path(
    get,
    path = "/v1/cache/stats",
    tag = "cache",
    summary = "Per-resource cache statistics",
    responses(
        (status = 200, description = "Cache statistics", body = ServiceCacheStats)
    )
)]
pub async fn cache_stats_handler(State(state): State<ServerState>) -> Json<ServiceCacheStats> {
    Json(state.service().cache_stats())
}
