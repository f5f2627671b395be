// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Concurrent per-chain fan-out with failure isolation
//!
//! Every aggregation issues one upstream call per applicable chain, waits for
//! all of them to settle, drops the failed ones and merges the rest into the
//! resource's canonical order. The order never depends on which chain answered
//! first.

use std::{collections::HashSet, sync::Arc, time::Instant};

use alloy_primitives::Address;
use api_client::{
    ApiError, Collectible, CollectibleProvider, Token, TokenProvider, Transaction,
    TransactionProvider,
};
use futures::future::join_all;
use shared_types::{Chain, ChainRegistry};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{Aggregated, AggregationError, ChainOutcome, OutcomeObserver, ResourceKind};

/// Maximum number of transactions kept after merging
pub const MAX_TRANSACTIONS: usize = 50;

/// Per-chain results that survived a fan-out
struct Settled<'a, R> {
    batches: Vec<(&'a Chain, Vec<R>)>,
    outcomes: Vec<ChainOutcome>,
}

/// Fans requests out over every chain of a registry
///
/// `P` serves token balances and transactions, `N` serves NFTs.
#[derive(Debug)]
pub struct Aggregator<P, N> {
    balances: Arc<P>,
    nfts: Arc<N>,
    registry: Arc<ChainRegistry>,
    observer: Arc<dyn OutcomeObserver>,
}

impl<P, N> Aggregator<P, N>
where
    P: TokenProvider + TransactionProvider,
    N: CollectibleProvider,
{
    /// Create a new aggregator
    pub fn new(
        balances: Arc<P>,
        nfts: Arc<N>,
        registry: Arc<ChainRegistry>,
        observer: Arc<dyn OutcomeObserver>,
    ) -> Self {
        Self {
            balances,
            nfts,
            registry,
            observer,
        }
    }

    /// Chains this aggregator fans out to
    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Token balances of `address` across every chain
    ///
    /// Zero balances and zero-valued tokens are dropped. A contract reported
    /// twice for the same chain is kept once, first occurrence wins. The result
    /// is sorted by quote value, highest first.
    ///
    /// # Errors
    ///
    /// Fails only when the registry is empty or `cancel` fires
    pub async fn tokens(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<Aggregated<Token>, AggregationError> {
        let chains = self.all_chains()?;
        let settled = self
            .fan_out(ResourceKind::Tokens, chains, cancel, |chain| {
                self.balances.fetch_token_balances(chain, address)
            })
            .await?;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for (chain, records) in settled.batches {
            for record in records {
                if record.has_value() && seen.insert((chain.id, record.contract_address)) {
                    items.push(Token::from_record(chain, record));
                }
            }
        }
        items.sort_by(|a, b| b.quote_value.total_cmp(&a.quote_value));

        Ok(Aggregated {
            items,
            outcomes: settled.outcomes,
        })
    }

    /// NFTs owned by `address` on every chain with an NFT provider
    ///
    /// Items without an image are dropped. The result is sorted by chain name,
    /// then by item name ignoring case.
    ///
    /// # Errors
    ///
    /// Fails only when the registry is empty or `cancel` fires
    pub async fn collectibles(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<Aggregated<Collectible>, AggregationError> {
        self.all_chains()?;
        let chains: Vec<&Chain> = self.registry.nft_chains().collect();
        if chains.is_empty() {
            debug!("no chain supports collectibles");
            return Ok(Aggregated {
                items: Vec::new(),
                outcomes: Vec::new(),
            });
        }

        let settled = self
            .fan_out(ResourceKind::Collectibles, chains, cancel, |chain| {
                self.nfts.fetch_owned_nfts(chain, address)
            })
            .await?;

        let mut items: Vec<Collectible> = settled
            .batches
            .into_iter()
            .flat_map(|(chain, records)| {
                records
                    .into_iter()
                    .filter_map(move |record| Collectible::from_record(chain, record))
            })
            .collect();
        items.sort_by_cached_key(|item| {
            (item.chain_name.to_lowercase(), item.name.to_lowercase())
        });

        Ok(Aggregated {
            items,
            outcomes: settled.outcomes,
        })
    }

    /// Most recent transactions of `address` across every chain
    ///
    /// Sorted newest first and capped at [`MAX_TRANSACTIONS`].
    ///
    /// # Errors
    ///
    /// Fails only when the registry is empty or `cancel` fires
    pub async fn transactions(
        &self,
        address: Address,
        cancel: &CancellationToken,
    ) -> Result<Aggregated<Transaction>, AggregationError> {
        let chains = self.all_chains()?;
        let settled = self
            .fan_out(ResourceKind::Transactions, chains, cancel, |chain| {
                self.balances.fetch_transactions(chain, address)
            })
            .await?;

        let mut items: Vec<Transaction> = settled
            .batches
            .into_iter()
            .flat_map(|(chain, records)| {
                records
                    .into_iter()
                    .map(move |record| Transaction::from_record(chain, record, address))
            })
            .collect();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(MAX_TRANSACTIONS);

        Ok(Aggregated {
            items,
            outcomes: settled.outcomes,
        })
    }

    fn all_chains(&self) -> Result<Vec<&Chain>, AggregationError> {
        if self.registry.is_empty() {
            return Err(AggregationError::NoChainsConfigured);
        }
        Ok(self.registry.chains().iter().collect())
    }

    /// Call `call` once per chain concurrently and wait for every call
    async fn fan_out<'a, R, F, Fut>(
        &self,
        resource: ResourceKind,
        chains: Vec<&'a Chain>,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<Settled<'a, R>, AggregationError>
    where
        F: Fn(&'a Chain) -> Fut,
        Fut: Future<Output = Result<Vec<R>, ApiError>>,
    {
        let calls = chains.into_iter().map(|chain| {
            let request = call(chain);
            async move {
                let started = Instant::now();
                let result = request.await;
                (chain, result, started.elapsed())
            }
        });

        let results = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(resource = %resource, "aggregation cancelled");
                return Err(AggregationError::Cancelled);
            }
            results = join_all(calls) => results,
        };

        let mut batches = Vec::with_capacity(results.len());
        let mut outcomes = Vec::with_capacity(results.len());
        for (chain, result, elapsed) in results {
            let result = match result {
                Ok(records) => {
                    let count = records.len();
                    batches.push((chain, records));
                    Ok(count)
                }
                Err(error) => Err(Arc::new(error)),
            };
            let outcome = ChainOutcome {
                resource,
                chain_id: chain.id,
                chain_name: chain.name.clone(),
                result,
                elapsed,
            };
            self.observer.chain_outcome(&outcome);
            outcomes.push(outcome);
        }

        Ok(Settled { batches, outcomes })
    }
}
