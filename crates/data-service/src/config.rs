// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Cache tuning for the data service

use std::time::Duration;

use crate::{FreshnessPolicy, ResourceKind, RetryPolicy};

/// Freshness windows, garbage collection and retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Freshness window for token balances
    pub tokens_freshness: Duration,
    /// Freshness window for collectibles
    pub collectibles_freshness: Duration,
    /// Freshness window for transactions
    pub transactions_freshness: Duration,
    /// Freshness window for the users list
    pub users_freshness: Duration,
    /// Freshness window for the derived balance
    pub balance_freshness: Duration,
    /// Entries not read for this long are dropped
    pub gc_after: Duration,
    /// Retry policy for background and first-load fetches
    pub retry: RetryPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tokens_freshness: Duration::from_secs(120),
            collectibles_freshness: Duration::from_secs(300),
            transactions_freshness: Duration::from_secs(60),
            users_freshness: Duration::from_secs(300),
            balance_freshness: Duration::from_secs(120),
            gc_after: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Freshness policy for `resource`
    pub fn freshness(&self, resource: ResourceKind) -> FreshnessPolicy {
        FreshnessPolicy::new(match resource {
            ResourceKind::Tokens => self.tokens_freshness,
            ResourceKind::Collectibles => self.collectibles_freshness,
            ResourceKind::Transactions => self.transactions_freshness,
            ResourceKind::Balance => self.balance_freshness,
            ResourceKind::Users => self.users_freshness,
        })
    }
}
