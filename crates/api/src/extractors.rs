// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! This module provides the wallet address path extractor, which rejects
//! malformed addresses with a `400` and a hint instead of the default
//! Axum path rejection.

use alloy_primitives::Address;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::ServerError;

mod error_hints {
    pub const MISSING_PREFIX: &str = "address must start with '0x'";
    pub const WRONG_LENGTH: &str = "address must be 40 hexadecimal characters after '0x'";
    pub const NOT_HEX: &str = "address contains non-hexadecimal characters";
    pub const MISSING: &str = "address path segment is missing";
}

const ADDRESS_HEX_LENGTH: usize = 40;

/// Wallet address taken from the `{address}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletAddress(pub Address);

impl<S> FromRequestParts<S> for WalletAddress
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ServerError::ValidationError(error_hints::MISSING.to_string()))?;
        parse_address(&raw).map(Self)
    }
}

/// Parse a `0x`-prefixed 20-byte hex address
///
/// # Errors
///
/// Returns `ServerError::ValidationError` naming what is wrong with `raw`
pub fn parse_address(raw: &str) -> Result<Address, ServerError> {
    let invalid = |hint: &str| ServerError::ValidationError(format!("invalid address '{raw}': {hint}"));

    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| invalid(error_hints::MISSING_PREFIX))?;
    if hex.len() != ADDRESS_HEX_LENGTH {
        return Err(invalid(error_hints::WRONG_LENGTH));
    }
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(invalid(error_hints::NOT_HEX));
    }

    hex.parse::<Address>()
        .map_err(|error| invalid(&error.to_string()))
}
