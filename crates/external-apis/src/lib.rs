// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! External API integrations for wallet data providers
//!
//! This crate provides the concrete upstream clients behind the capability
//! traits of `api-client`.
//!
//! # Clients
//!
//! - [`covalent::CovalentClient`]: token balances and transactions, per chain id
//! - [`alchemy::AlchemyClient`]: owned NFTs, per chain NFT base URL
//! - [`users::UsersClient`]: the users list
//!
//! Every client issues one request per call, bounded by its configured
//! timeout, and maps failures into `ApiError` so callers can classify them.
//! Required strings are validated with [`non_empty_string::NonEmptyString`].

pub mod alchemy;
pub mod covalent;
mod http;
pub mod non_empty_string;
pub mod users;

pub use alchemy::*;
pub use covalent::*;
pub use http::HttpFailure;
pub use non_empty_string::{EmptyStringError, NonEmptyString};
pub use users::*;
