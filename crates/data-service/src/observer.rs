// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Observability hook for per-chain outcomes and cache operations

use std::fmt;

use tracing::{debug, trace, warn};

use crate::{ChainOutcome, ResourceKind};

/// Cache operations reported to an [`OutcomeObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    /// Fresh value served
    Hit,
    /// Stale value served, background refresh requested
    StaleHit,
    /// No value cached
    Miss,
    /// Upstream fetch started
    Fetch,
    /// Fetch failed after its retries
    FetchFailure,
    /// Unused entry removed
    Evict,
}

impl CacheOperation {
    /// Stable name, used as a metric label
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::StaleHit => "stale_hit",
            Self::Miss => "miss",
            Self::Fetch => "fetch",
            Self::FetchFailure => "fetch_failure",
            Self::Evict => "evict",
        }
    }
}

/// Receives every per-chain outcome of every fan-out
pub trait OutcomeObserver: Send + Sync + fmt::Debug {
    /// Called once per chain after its call settled
    fn chain_outcome(&self, outcome: &ChainOutcome);

    /// Called for each cache operation
    fn cache_operation(&self, resource: ResourceKind, operation: CacheOperation) {
        let _ = (resource, operation);
    }
}

/// Observer that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl OutcomeObserver for TracingObserver {
    fn chain_outcome(&self, outcome: &ChainOutcome) {
        let elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX);
        match &outcome.result {
            Ok(items) => debug!(
                resource = %outcome.resource,
                chain_id = outcome.chain_id.chain_id(),
                chain = %outcome.chain_name,
                items,
                elapsed_ms,
                "chain fetch succeeded"
            ),
            Err(error) => warn!(
                resource = %outcome.resource,
                chain_id = outcome.chain_id.chain_id(),
                chain = %outcome.chain_name,
                error = %error,
                elapsed_ms,
                "chain fetch failed, contributing no items"
            ),
        }
    }

    fn cache_operation(&self, resource: ResourceKind, operation: CacheOperation) {
        trace!(resource = %resource, operation = operation.as_str(), "cache operation");
    }
}
