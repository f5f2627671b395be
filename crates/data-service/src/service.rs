// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Cached facade over the aggregator and the users list
//!
//! [`DataService`] owns one [`QueryCache`] per resource kind. Token,
//! collectible and transaction caches fetch through the [`Aggregator`]; the
//! balance cache recomputes from the cached token entry and never calls an
//! upstream itself.

use std::{sync::Arc, time::Duration};

use alloy_primitives::Address;
use api_client::{
    Collectible, CollectibleProvider, MultichainBalance, Token, TokenProvider, Transaction,
    TransactionProvider, User, UserListProvider,
};
use futures::{FutureExt, future::BoxFuture};
use serde::Serialize;
use shared_types::ChainRegistry;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    Aggregated, Aggregator, CacheStats, OutcomeObserver, QueryCache, RefetchReport,
    ResourceKind, ServiceConfig, ServiceError, ServiceResult, Slot, UserDataSnapshot,
    balance::calculate_multichain_balance,
};

type FetchFuture<V> = BoxFuture<'static, ServiceResult<V>>;

/// Upstream clients used by the service
#[derive(Debug)]
pub struct Providers<P, N, U> {
    /// Token balances and transactions
    pub balances: Arc<P>,
    /// Owned NFTs
    pub nfts: Arc<N>,
    /// Users list
    pub users: Arc<U>,
}

/// Statistics of every cache of the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ServiceCacheStats {
    /// Token cache
    pub tokens: CacheStats,
    /// Collectible cache
    pub collectibles: CacheStats,
    /// Transaction cache
    pub transactions: CacheStats,
    /// Derived balance cache
    pub balance: CacheStats,
    /// Users list cache
    pub users: CacheStats,
}

/// Cached multichain data access for wallet views
#[derive(Debug)]
pub struct DataService<P, N, U> {
    aggregator: Arc<Aggregator<P, N>>,
    users: Arc<U>,
    registry: Arc<ChainRegistry>,
    tokens: QueryCache<Address, Aggregated<Token>>,
    collectibles: QueryCache<Address, Aggregated<Collectible>>,
    transactions: QueryCache<Address, Aggregated<Transaction>>,
    balance: QueryCache<Address, MultichainBalance>,
    users_list: QueryCache<(), Vec<User>>,
    shutdown: CancellationToken,
}

impl<P, N, U> DataService<P, N, U>
where
    P: TokenProvider + TransactionProvider + 'static,
    N: CollectibleProvider + 'static,
    U: UserListProvider + 'static,
{
    /// Create a new service
    ///
    /// Every aggregation runs under a child of `shutdown`, so cancelling it
    /// abandons all in-flight upstream calls.
    pub fn new(
        providers: Providers<P, N, U>,
        registry: Arc<ChainRegistry>,
        config: ServiceConfig,
        observer: Arc<dyn OutcomeObserver>,
        shutdown: CancellationToken,
    ) -> Self {
        let tokens = new_cache(ResourceKind::Tokens, &config, &observer);
        let collectibles = new_cache(ResourceKind::Collectibles, &config, &observer);
        let transactions = new_cache(ResourceKind::Transactions, &config, &observer);
        let balance = new_cache(ResourceKind::Balance, &config, &observer);
        let users_list = new_cache(ResourceKind::Users, &config, &observer);

        let aggregator = Arc::new(Aggregator::new(
            providers.balances,
            providers.nfts,
            Arc::clone(&registry),
            observer,
        ));

        info!(
            chains = registry.len(),
            nft_chains = registry.nft_chains().count(),
            "data service initialized"
        );

        Self {
            aggregator,
            users: providers.users,
            registry,
            tokens,
            collectibles,
            transactions,
            balance,
            users_list,
            shutdown,
        }
    }

    /// Chains the service aggregates over
    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Token balances of `address` across every chain, sorted by value
    ///
    /// # Errors
    ///
    /// Fails only on first load when the registry is empty or the service is
    /// shutting down. A failing chain contributes no tokens.
    pub async fn fetch_tokens(&self, address: Address) -> Slot<Aggregated<Token>> {
        self.tokens
            .get(address, self.tokens_fetcher(address))
            .await
    }

    /// NFTs owned by `address`, sorted by chain then name
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::fetch_tokens`]
    pub async fn fetch_collectibles(&self, address: Address) -> Slot<Aggregated<Collectible>> {
        self.collectibles
            .get(address, self.collectibles_fetcher(address))
            .await
    }

    /// Up to 50 most recent transactions of `address`, newest first
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::fetch_tokens`]
    pub async fn fetch_transactions(&self, address: Address) -> Slot<Aggregated<Transaction>> {
        self.transactions
            .get(address, self.transactions_fetcher(address))
            .await
    }

    /// Multichain balance of `address`, derived from its cached tokens
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Dependency`] when the tokens cannot be loaded
    pub async fn fetch_multichain_balance(&self, address: Address) -> Slot<MultichainBalance> {
        self.balance
            .get(address, self.balance_fetcher(address))
            .await
    }

    /// Derive a balance summary from an arbitrary token collection
    pub fn calculate_multichain_balance(&self, tokens: &[Token]) -> MultichainBalance {
        calculate_multichain_balance(tokens, &self.registry)
    }

    /// The users list, sorted by rank
    ///
    /// # Errors
    ///
    /// The list has a single source, so its failure is returned as is once
    /// retries are exhausted and nothing was cached before
    pub async fn fetch_users(&self) -> Slot<Vec<User>> {
        let users = Arc::clone(&self.users);
        let shutdown = self.shutdown.clone();
        let fetcher = move || -> FetchFuture<Vec<User>> {
            let users = Arc::clone(&users);
            let cancel = shutdown.child_token();
            async move {
                let mut list = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(ServiceError::Cancelled),
                    list = users.fetch_users() => list?,
                };
                list.sort_by_key(|user| user.rank);
                debug!(users = list.len(), "users list fetched");
                Ok(list)
            }
            .boxed()
        };
        self.users_list.get((), fetcher).await
    }

    /// Refetch the tokens of `address`, bypassing freshness
    ///
    /// A cached balance for `address` is recomputed from the new tokens.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; the previous tokens stay cached
    pub async fn refetch_tokens(&self, address: Address) -> Result<(), Arc<ServiceError>> {
        self.tokens
            .refresh(address, self.tokens_fetcher(address))
            .await?;
        if self.balance.peek(&address).is_some()
            && let Err(error) = self
                .balance
                .refresh(address, self.balance_fetcher(address))
                .await
        {
            warn!(%address, %error, "balance recompute after token refresh failed");
        }
        Ok(())
    }

    /// Refetch the collectibles of `address`, bypassing freshness
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; the previous collectibles stay cached
    pub async fn refetch_collectibles(&self, address: Address) -> Result<(), Arc<ServiceError>> {
        self.collectibles
            .refresh(address, self.collectibles_fetcher(address))
            .await
            .map(drop)
    }

    /// Refetch the transactions of `address`, bypassing freshness
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; the previous transactions stay cached
    pub async fn refetch_transactions(&self, address: Address) -> Result<(), Arc<ServiceError>> {
        self.transactions
            .refresh(address, self.transactions_fetcher(address))
            .await
            .map(drop)
    }

    /// Refetch tokens, collectibles and transactions concurrently
    ///
    /// Returns once all three settled. One failing does not stop the others.
    pub async fn refetch_all(&self, address: Address) -> RefetchReport {
        let (tokens, collectibles, transactions) = tokio::join!(
            self.refetch_tokens(address),
            self.refetch_collectibles(address),
            self.refetch_transactions(address)
        );
        let report = RefetchReport {
            tokens,
            collectibles,
            transactions,
        };
        if report.all_ok() {
            debug!(%address, "manual refresh completed");
        } else {
            warn!(%address, "manual refresh completed with failures");
        }
        report
    }

    /// Everything shown for `address`, each part loaded independently
    ///
    /// The balance is only derived when tokens loaded and are not empty.
    pub async fn fetch_user_data(&self, address: Address) -> UserDataSnapshot {
        let (tokens, collectibles, transactions) = tokio::join!(
            self.fetch_tokens(address),
            self.fetch_collectibles(address),
            self.fetch_transactions(address)
        );
        let balance = match &tokens {
            Ok(read) if !read.value.items.is_empty() => {
                Some(self.fetch_multichain_balance(address).await)
            }
            _ => None,
        };
        UserDataSnapshot {
            tokens,
            collectibles,
            transactions,
            balance,
        }
    }

    /// Statistics of every cache
    pub fn cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats {
            tokens: self.tokens.stats(),
            collectibles: self.collectibles.stats(),
            transactions: self.transactions.stats(),
            balance: self.balance.stats(),
            users: self.users_list.stats(),
        }
    }

    /// Drop entries of every cache not read within the garbage collection window
    pub fn cleanup_unused(&self) -> usize {
        self.tokens.cleanup_unused()
            + self.collectibles.cleanup_unused()
            + self.transactions.cleanup_unused()
            + self.balance.cleanup_unused()
            + self.users_list.cleanup_unused()
    }

    /// Run [`Self::cleanup_unused`] every `period` until shutdown
    pub fn spawn_gc_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        debug!("cache sweeper stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let removed = service.cleanup_unused();
                        debug!(removed, "cache sweep finished");
                    }
                }
            }
        })
    }

    /// Cancel every in-flight aggregation and stop the sweeper
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn tokens_fetcher(
        &self,
        address: Address,
    ) -> impl Fn() -> FetchFuture<Aggregated<Token>> + Send + Sync + 'static + use<P, N, U> {
        token_fetcher(
            Arc::clone(&self.aggregator),
            self.balance.clone(),
            self.shutdown.clone(),
            address,
        )
    }

    fn collectibles_fetcher(
        &self,
        address: Address,
    ) -> impl Fn() -> FetchFuture<Aggregated<Collectible>> + Send + Sync + 'static + use<P, N, U>
    {
        let aggregator = Arc::clone(&self.aggregator);
        let shutdown = self.shutdown.clone();
        move || {
            let aggregator = Arc::clone(&aggregator);
            let cancel = shutdown.child_token();
            async move { Ok(aggregator.collectibles(address, &cancel).await?) }.boxed()
        }
    }

    fn transactions_fetcher(
        &self,
        address: Address,
    ) -> impl Fn() -> FetchFuture<Aggregated<Transaction>> + Send + Sync + 'static + use<P, N, U>
    {
        let aggregator = Arc::clone(&self.aggregator);
        let shutdown = self.shutdown.clone();
        move || {
            let aggregator = Arc::clone(&aggregator);
            let cancel = shutdown.child_token();
            async move { Ok(aggregator.transactions(address, &cancel).await?) }.boxed()
        }
    }

    fn balance_fetcher(
        &self,
        address: Address,
    ) -> impl Fn() -> FetchFuture<MultichainBalance> + Send + Sync + 'static + use<P, N, U> {
        let aggregator = Arc::clone(&self.aggregator);
        let tokens = self.tokens.clone();
        let balance = self.balance.clone();
        let registry = Arc::clone(&self.registry);
        let shutdown = self.shutdown.clone();
        move || {
            let fetch_tokens = token_fetcher(
                Arc::clone(&aggregator),
                balance.clone(),
                shutdown.clone(),
                address,
            );
            let tokens = tokens.clone();
            let registry = Arc::clone(&registry);
            async move {
                let dependency = |source| ServiceError::Dependency {
                    resource: ResourceKind::Tokens,
                    source,
                };
                let read = tokens.get(address, fetch_tokens).await.map_err(dependency)?;
                // a running token fetch (background or manual) wins over the read
                let current = match tokens.in_flight(&address) {
                    Some(flight) => flight.await.unwrap_or(read.value),
                    None => tokens
                        .peek(&address)
                        .map_or(read.value, |latest| latest.value),
                };
                Ok(calculate_multichain_balance(&current.items, &registry))
            }
            .boxed()
        }
    }
}

fn new_cache<K, V>(
    resource: ResourceKind,
    config: &ServiceConfig,
    observer: &Arc<dyn OutcomeObserver>,
) -> QueryCache<K, V>
where
    K: Eq + std::hash::Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    QueryCache::new(
        resource,
        config.freshness(resource),
        config.retry,
        config.gc_after,
        Arc::clone(observer),
    )
}

/// Fetcher for the token cache; a successful fetch marks the balance stale
fn token_fetcher<P, N>(
    aggregator: Arc<Aggregator<P, N>>,
    balance: QueryCache<Address, MultichainBalance>,
    shutdown: CancellationToken,
    address: Address,
) -> impl Fn() -> FetchFuture<Aggregated<Token>> + Send + Sync + 'static
where
    P: TokenProvider + TransactionProvider + 'static,
    N: CollectibleProvider + 'static,
{
    move || {
        let aggregator = Arc::clone(&aggregator);
        let balance = balance.clone();
        let cancel = shutdown.child_token();
        async move {
            let aggregated = aggregator.tokens(address, &cancel).await?;
            balance.invalidate(&address);
            Ok(aggregated)
        }
        .boxed()
    }
}
