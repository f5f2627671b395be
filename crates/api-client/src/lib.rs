// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream provider abstractions for the wallet data service
//!
//! This crate defines the capability traits every upstream client implements,
//! the error taxonomy shared by all of them, and the canonical entities the
//! aggregation layer produces.
//!
//! # Core Abstractions
//!
//! - **Capability traits**: [`TokenProvider`], [`TransactionProvider`],
//!   [`CollectibleProvider`] and [`UserListProvider`], all extending
//!   [`UpstreamClient`]
//! - **Records**: provider-neutral shapes returned by the clients, see [`records`]
//! - **Entities**: canonical chain-tagged values, see [`types`]
//! - **Errors**: [`ApiError`] with the classification used by the retry policy
//!
//! Clients perform exactly one request per call and never retry on their own.

use alloy_primitives::Address;
use shared_types::Chain;
use thiserror::Error;

pub mod records;
pub mod types;

pub use records::*;
pub use types::*;

/// Common supertrait of every upstream client
pub trait UpstreamClient: Send + Sync {
    /// Get the name/identifier of this client, used in logs and metrics
    fn name(&self) -> &'static str;
}

/// Source of per-chain fungible token balances
pub trait TokenProvider: UpstreamClient {
    /// Fetch the token balances held by `address` on `chain`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that cannot be decoded
    fn fetch_token_balances(
        &self,
        chain: &Chain,
        address: Address,
    ) -> impl Future<Output = Result<Vec<TokenBalanceRecord>, ApiError>> + Send;
}

/// Source of per-chain transaction history
pub trait TransactionProvider: UpstreamClient {
    /// Fetch the most recent transactions involving `address` on `chain`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that cannot be decoded
    fn fetch_transactions(
        &self,
        chain: &Chain,
        address: Address,
    ) -> impl Future<Output = Result<Vec<TransactionRecord>, ApiError>> + Send;
}

/// Source of per-chain NFT ownership
///
/// Only chains exposing an NFT base URL are ever passed to this provider.
pub trait CollectibleProvider: UpstreamClient {
    /// Fetch the NFTs owned by `owner` on `chain`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when the chain has no NFT base URL,
    /// otherwise the same failures as the other providers
    fn fetch_owned_nfts(
        &self,
        chain: &Chain,
        owner: Address,
    ) -> impl Future<Output = Result<Vec<NftRecord>, ApiError>> + Send;
}

/// Source of the users list
pub trait UserListProvider: UpstreamClient {
    /// Fetch the full users list, in upstream order
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that cannot be decoded
    fn fetch_users(&self) -> impl Future<Output = Result<Vec<User>, ApiError>> + Send;
}

/// Common errors that can occur when working with upstream clients
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// Request could not be sent or the connection failed
    #[error("HTTP transport failed: {message}")]
    Transport { message: String },

    /// Upstream answered with a non-success status
    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Body did not match the expected schema
    #[error("invalid response format: {message}")]
    Decode { message: String },

    /// Network timeout
    #[error("request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Authentication failed
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Rate limit exceeded
    #[error("rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Client independent error
    #[error(transparent)]
    Custom { error: anyhow::Error },
}

impl ApiError {
    /// HTTP status equivalent of this error, when one exists
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::RateLimitExceeded { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether the failure originates on the upstream side (5xx-equivalent)
    ///
    /// Only these failures are worth retrying. Decode, 4xx, rate-limit and
    /// configuration failures repeat identically.
    pub const fn is_server_side(&self) -> bool {
        match self.status_code() {
            Some(status) => status >= 500,
            None => matches!(self, Self::Transport { .. } | Self::Timeout { .. }),
        }
    }
}
