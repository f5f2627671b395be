// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Value types returned by the aggregation and cache layers

use std::{fmt, sync::Arc, time::Duration};

use api_client::{ApiError, Collectible, MultichainBalance, Token, Transaction};
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use utoipa::ToSchema;

use crate::ServiceError;

/// Cached resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Fungible token balances
    Tokens,
    /// Owned NFTs
    Collectibles,
    /// Transaction history
    Transactions,
    /// Derived multichain balance
    Balance,
    /// Users list
    Users,
}

impl ResourceKind {
    /// Stable lowercase name, used in logs and metric labels
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::Collectibles => "collectibles",
            Self::Transactions => "transactions",
            Self::Balance => "balance",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one per-chain upstream call within a fan-out
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Resource being aggregated
    pub resource: ResourceKind,
    /// Chain queried
    pub chain_id: ChainId,
    /// Chain display name
    pub chain_name: String,
    /// Number of items received, or the failure
    pub result: Result<usize, Arc<ApiError>>,
    /// Time the call took
    pub elapsed: Duration,
}

impl ChainOutcome {
    /// Whether the chain contributed a result
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Merged result of a fan-out
#[derive(Debug, Clone)]
pub struct Aggregated<T> {
    /// Merged, filtered and ordered items
    pub items: Vec<T>,
    /// One outcome per queried chain, in registry order
    pub outcomes: Vec<ChainOutcome>,
}

impl<T> Aggregated<T> {
    /// Outcomes of the chains whose call failed
    pub fn failed_chains(&self) -> impl Iterator<Item = &ChainOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_ok())
    }

    /// True when at least one chain was queried and every one failed
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|outcome| !outcome.is_ok())
    }
}

/// Value served from a cache together with its freshness state
#[derive(Debug)]
pub struct CacheRead<V> {
    /// Last good value
    pub value: Arc<V>,
    /// Whether the value is older than its freshness window
    pub stale: bool,
    /// Failure of the most recent background refresh, if it failed
    pub error: Option<Arc<ServiceError>>,
    /// Age of the value
    pub age: Duration,
}

impl<V> Clone for CacheRead<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            stale: self.stale,
            error: self.error.clone(),
            age: self.age,
        }
    }
}

/// Outcome of a cached read that may have failed on first load
pub type Slot<V> = Result<CacheRead<V>, Arc<ServiceError>>;

/// Per-resource outcome of a manual refresh
#[derive(Debug, Clone)]
pub struct RefetchReport {
    /// Token refresh result
    pub tokens: Result<(), Arc<ServiceError>>,
    /// Collectible refresh result
    pub collectibles: Result<(), Arc<ServiceError>>,
    /// Transaction refresh result
    pub transactions: Result<(), Arc<ServiceError>>,
}

impl RefetchReport {
    /// True when every resource refreshed
    pub fn all_ok(&self) -> bool {
        self.tokens.is_ok() && self.collectibles.is_ok() && self.transactions.is_ok()
    }
}

/// Everything shown for one address, each part loaded independently
#[derive(Debug, Clone)]
pub struct UserDataSnapshot {
    /// Token balances
    pub tokens: Slot<Aggregated<Token>>,
    /// Owned NFTs
    pub collectibles: Slot<Aggregated<Collectible>>,
    /// Transaction history
    pub transactions: Slot<Aggregated<Transaction>>,
    /// Multichain balance, absent while the token collection is empty or failed
    pub balance: Option<Slot<MultichainBalance>>,
}
