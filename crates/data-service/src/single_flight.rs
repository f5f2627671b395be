// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Single-flight gate
//!
//! At most one fetch per key is in progress at any time. Concurrent callers
//! for the same key share the in-flight result. Each flight is driven by its
//! own task, so it completes even when every caller stops waiting.

use std::{fmt, hash::Hash, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use tracing::trace;

use crate::ServiceError;

/// Outcome shared by every waiter of a flight
pub type FlightResult<V> = Result<Arc<V>, Arc<ServiceError>>;

/// Handle on an in-flight fetch
pub type SharedFlight<V> = Shared<BoxFuture<'static, FlightResult<V>>>;

/// Deduplicates concurrent fetches per key
pub struct SingleFlight<K, V> {
    in_flight: Arc<DashMap<K, SharedFlight<V>>>,
}

impl<K: Eq + Hash, V> fmt::Debug for SingleFlight<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create an empty gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the flight for `key`, or start one with `fetch` if none is running
    ///
    /// `fetch` is only invoked when a new flight starts. The second element of
    /// the returned pair is `true` for the caller that started it.
    pub fn join_or_start<F, Fut>(&self, key: K, fetch: F) -> (SharedFlight<V>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightResult<V>> + Send + 'static,
    {
        let flight = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(existing) => {
                trace!(?key, "joining in-flight fetch");
                return (existing.get().clone(), false);
            }
            Entry::Vacant(slot) => {
                let in_flight = Arc::clone(&self.in_flight);
                let fetch = fetch();
                let flight = async move {
                    let result = fetch.await;
                    in_flight.remove(&key);
                    result
                }
                .boxed()
                .shared();
                slot.insert(flight.clone());
                flight
            }
        };

        tokio::spawn(flight.clone());
        (flight, true)
    }

    /// The in-flight fetch for `key`, if any
    pub fn get(&self, key: &K) -> Option<SharedFlight<V>> {
        self.in_flight.get(key).map(|flight| flight.clone())
    }

    /// Whether a fetch for `key` is running
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Number of running fetches
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// True when nothing is in flight
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}
