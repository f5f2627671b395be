// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet API Server Implementation
//!
//! This crate provides the HTTP server over the multichain data service, built
//! with Axum, with layered configuration, Prometheus metrics and graceful
//! shutdown.
//!
//! # Module Structure
//!
//! - [`config`]: Server, provider and cache configuration with hierarchical loading
//! - [`error`]: Error types and their HTTP status mapping
//! - [`state`]: Shared application state wiring the upstream clients into the data service
//! - [`server`]: Server lifecycle, middleware stack, cache sweeper and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`extractors`]: Wallet address path extraction with descriptive rejections
//! - [`metrics`]: Prometheus metrics fed by the data service observer hook
//! - [`openapi`]: `OpenAPI` specification and Swagger UI endpoints
//!
//! # Key Features
//!
//! - **Partial results**: a failing chain is reported next to the items of the others
//! - **Stale-while-revalidate**: cached values are served while a refresh runs
//! - **Graceful Shutdown**: one root `CancellationToken` stops the listener,
//!   in-flight fan-outs and the cache sweeper

pub mod config;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use shared_types::{Chain, ChainId, ChainRegistry};
pub use state::{HealthCheck, ServerState, WalletService};
