// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider-neutral upstream records
//!
//! Clients decode their own wire formats into these shapes. Records carry no
//! chain identity; the aggregator tags them when building canonical entities.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ExplorerRef;

/// One fungible balance as reported by a balances provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalanceRecord {
    /// Token contract address
    pub contract_address: Address,
    /// Contract name, when the provider knows it
    pub contract_name: Option<String>,
    /// Ticker symbol
    pub symbol: String,
    /// Decimals of the smallest unit
    pub decimals: u8,
    /// Whether this is the chain's native currency
    pub is_native: bool,
    /// Balance in the smallest unit, as a decimal integer string
    pub balance_raw: String,
    /// Fiat value of the balance
    pub quote: f64,
    /// Fiat value of the balance 24 hours ago
    pub quote_24h: f64,
    /// Provider-formatted fiat value
    pub pretty_quote: Option<String>,
    /// Token logo
    pub logo_url: Option<String>,
}

impl TokenBalanceRecord {
    /// Nonzero balance with a nonzero fiat quote
    pub fn has_value(&self) -> bool {
        let zero_balance = self.balance_raw.is_empty() || self.balance_raw.bytes().all(|b| b == b'0');
        !zero_balance && self.quote != 0.0
    }
}

/// One transaction as reported by a transactions provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash
    pub hash: String,
    /// Block signing time
    pub signed_at: DateTime<Utc>,
    /// Sender
    pub from: Address,
    /// Recipient, absent for contract creations
    pub to: Option<Address>,
    /// Transferred native value in the smallest unit
    pub value_raw: Option<String>,
    /// Block explorer links, in provider order
    pub explorers: Vec<ExplorerRef>,
}

/// One owned NFT as reported by an NFT provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftRecord {
    /// Collection contract address
    pub contract_address: Address,
    /// Token identifier within the collection
    pub token_id: String,
    /// Display name (`name`, falling back to `title`)
    pub name: Option<String>,
    /// Best available image (thumbnail, cached, then original)
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(balance: &str, quote: f64) -> TokenBalanceRecord {
        TokenBalanceRecord {
            contract_address: Address::ZERO,
            contract_name: None,
            symbol: "ETH".to_string(),
            decimals: 18,
            is_native: true,
            balance_raw: balance.to_string(),
            quote,
            quote_24h: 0.0,
            pretty_quote: None,
            logo_url: None,
        }
    }

    #[test]
    fn value_filter() {
        assert!(record("1000", 1.5).has_value());
        assert!(!record("0", 1.5).has_value());
        assert!(!record("000", 1.5).has_value());
        assert!(!record("", 1.5).has_value());
        assert!(!record("1000", 0.0).has_value());
    }
}
