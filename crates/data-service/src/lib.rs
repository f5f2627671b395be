// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Multichain aggregation and caching engine
//!
//! This crate turns per-chain upstream clients into one canonical view of an
//! address: tokens, collectibles and transactions merged across every chain of
//! the registry, plus a derived cross-chain balance.
//!
//! # Architecture
//!
//! - [`aggregator`]: concurrent per-chain fan-out with failure isolation and
//!   deterministic ordering
//! - [`balance`]: pure multichain balance derivation
//! - [`cache`]: keyed cache composed from [`freshness::FreshnessPolicy`],
//!   [`retry::RetryPolicy`] and [`single_flight::SingleFlight`]
//! - [`service`]: the [`DataService`] facade consumed by the HTTP layer
//! - [`observer`]: hook receiving every per-chain outcome and cache operation
//!
//! A single chain failing never fails an aggregation. Only the users list,
//! cancellation and a first load that exhausted its retries surface as errors.

pub mod aggregator;
pub mod balance;
pub mod cache;
pub mod config;
pub mod error;
pub mod freshness;
pub mod observer;
pub mod retry;
pub mod service;
pub mod single_flight;
pub mod types;

pub use aggregator::Aggregator;
pub use balance::calculate_multichain_balance;
pub use cache::{CacheStats, QueryCache};
pub use config::ServiceConfig;
pub use error::{AggregationError, ServiceError, ServiceResult};
pub use freshness::FreshnessPolicy;
pub use observer::{CacheOperation, OutcomeObserver, TracingObserver};
pub use retry::RetryPolicy;
pub use service::{DataService, Providers, ServiceCacheStats};
pub use single_flight::SingleFlight;
pub use types::*;
