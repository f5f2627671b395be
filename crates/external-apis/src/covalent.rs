// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Covalent API integration
//!
//! Covalent serves both token balances and transaction history, keyed by the
//! numeric chain id. This module implements [`TokenProvider`] and
//! [`TransactionProvider`] on top of its `balances_v2` and `transactions_v3`
//! endpoints.

use alloy_primitives::Address;
use api_client::{
    ApiError, ExplorerRef, TokenBalanceRecord, TokenProvider, TransactionProvider,
    TransactionRecord, UpstreamClient,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use serde_with::{DefaultOnError, serde_as};
use shared_types::Chain;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    http::{HttpFailure, build_client, decode_each, get_json},
    non_empty_string::NonEmptyString,
};

/// Default Covalent API base URL
pub const DEFAULT_COVALENT_BASE_URL: &str = "https://api.covalenthq.com/v1";
const DEFAULT_COVALENT_TIMEOUT_SECONDS: u64 = 20;
const TRANSACTIONS_PAGE_SIZE: &str = "10";

/// Configuration for the Covalent API client
/// This type is always valid by construction.
#[derive(Debug, Clone)]
pub struct CovalentConfig {
    /// Base URL, without trailing slash
    pub base_url: NonEmptyString,
    /// API key sent as the `key` query parameter
    pub api_key: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl CovalentConfig {
    /// Create a new `CovalentConfig` with validation
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, CovalentError> {
        let base_url = NonEmptyString::new(base_url)
            .map_err(|_| CovalentError::Config("base URL cannot be empty".to_string()))?;
        Url::parse(base_url.as_str())
            .map_err(|error| CovalentError::Config(format!("invalid base URL: {error}")))?;
        let api_key = NonEmptyString::new(api_key)
            .map_err(|_| CovalentError::Config("API key cannot be empty".to_string()))?;
        Ok(Self {
            base_url,
            api_key,
            timeout_seconds: if timeout_seconds == 0 {
                DEFAULT_COVALENT_TIMEOUT_SECONDS
            } else {
                timeout_seconds
            },
        })
    }
}

/// Errors specific to the Covalent API client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum CovalentError {
    /// Request level failure
    #[error(transparent)]
    Request(#[from] HttpFailure),

    /// HTTP client could not be built
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    /// Successful status with `error: true` in the envelope
    #[error("Covalent error {code:?}: {message}")]
    Upstream { code: Option<u16>, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CovalentError> for ApiError {
    fn from(value: CovalentError) -> Self {
        match value {
            CovalentError::Request(failure) => failure.into(),
            CovalentError::Client(error) => ApiError::Configuration {
                message: error.to_string(),
            },
            CovalentError::Upstream { code, message } => ApiError::Status {
                status: code.unwrap_or(502),
                message,
            },
            CovalentError::Config(message) => ApiError::Configuration { message },
        }
    }
}

/// Covalent response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    error: bool,
    error_message: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ItemsPage<T> {
    items: Option<Vec<T>>,
}

/// Token balance item from `balances_v2`
///
/// A field of the wrong type reads as absent.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CovalentTokenItem {
    #[serde_as(as = "DefaultOnError")]
    contract_address: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    contract_name: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    contract_ticker_symbol: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    contract_decimals: Option<u8>,
    #[serde_as(as = "DefaultOnError")]
    native_token: bool,
    #[serde_as(as = "DefaultOnError")]
    balance: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    quote: Option<f64>,
    #[serde_as(as = "DefaultOnError")]
    quote_24h: Option<f64>,
    #[serde_as(as = "DefaultOnError")]
    pretty_quote: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    logo_url: Option<String>,
}

impl CovalentTokenItem {
    fn into_record(self) -> Option<TokenBalanceRecord> {
        let contract_address = parse_address(self.contract_address.as_deref())?;
        Some(TokenBalanceRecord {
            contract_address,
            contract_name: self.contract_name,
            symbol: self.contract_ticker_symbol.unwrap_or_default(),
            decimals: self.contract_decimals.unwrap_or_default(),
            is_native: self.native_token,
            balance_raw: self.balance.unwrap_or_else(|| "0".to_string()),
            quote: self.quote.unwrap_or_default(),
            quote_24h: self.quote_24h.unwrap_or_default(),
            pretty_quote: self.pretty_quote,
            logo_url: self.logo_url,
        })
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CovalentExplorer {
    #[serde_as(as = "DefaultOnError")]
    label: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    url: Option<String>,
}

/// Transaction item from `transactions_v3`
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CovalentTransactionItem {
    #[serde_as(as = "DefaultOnError")]
    tx_hash: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    block_signed_at: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    from_address: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    to_address: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    value: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    explorers: Vec<CovalentExplorer>,
}

impl CovalentTransactionItem {
    fn into_record(self) -> Option<TransactionRecord> {
        let hash = self.tx_hash.filter(|hash| !hash.is_empty())?;
        let signed_at = self
            .block_signed_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))?;
        let from = parse_address(self.from_address.as_deref())?;
        let to = parse_address(self.to_address.as_deref());
        let explorers = self
            .explorers
            .into_iter()
            .filter_map(|explorer| {
                Some(ExplorerRef {
                    url: explorer.url.filter(|url| !url.is_empty())?,
                    label: explorer.label.unwrap_or_default(),
                })
            })
            .collect();
        Some(TransactionRecord {
            hash,
            signed_at,
            from,
            to,
            value_raw: self.value,
            explorers,
        })
    }
}

fn parse_address(raw: Option<&str>) -> Option<Address> {
    raw.and_then(|raw| raw.parse().ok())
}

/// Covalent API client implementation
#[derive(Debug)]
pub struct CovalentClient {
    client: Client,
    config: CovalentConfig,
}

impl CovalentClient {
    /// Create a new Covalent API client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: CovalentConfig) -> Result<Self, CovalentError> {
        let client = build_client(config.timeout_seconds)?;
        Ok(Self { client, config })
    }

    async fn fetch_items<T: DeserializeOwned>(
        &self,
        chain: &Chain,
        address: Address,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, CovalentError> {
        let url = format!(
            "{}/{}/address/{address}/{endpoint}/",
            self.config.base_url.trim_end_slash(),
            chain.id.chain_id()
        );

        debug!(url, chain_id = chain.id.chain_id(), endpoint, "fetching from Covalent");

        let request = self
            .client
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .query(query);

        // items decode individually; a malformed one is dropped
        let envelope: Envelope<ItemsPage<Value>> =
            get_json(request, self.config.timeout_seconds, self.name()).await?;

        if envelope.error {
            return Err(CovalentError::Upstream {
                code: envelope.error_code,
                message: envelope
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        let items = envelope
            .data
            .and_then(|page| page.items)
            .unwrap_or_default();
        Ok(decode_each(items, self.name()))
    }
}

impl UpstreamClient for CovalentClient {
    fn name(&self) -> &'static str {
        "covalent"
    }
}

impl TokenProvider for CovalentClient {
    async fn fetch_token_balances(
        &self,
        chain: &Chain,
        address: Address,
    ) -> Result<Vec<TokenBalanceRecord>, ApiError> {
        let items: Vec<CovalentTokenItem> = self
            .fetch_items(chain, address, "balances_v2", &[("no-spam", "true")])
            .await?;
        let total = items.len();
        let records: Vec<_> = items
            .into_iter()
            .filter_map(CovalentTokenItem::into_record)
            .collect();
        if records.len() < total {
            debug!(
                chain_id = chain.id.chain_id(),
                skipped = total - records.len(),
                "skipped malformed Covalent balance items"
            );
        }
        Ok(records)
    }
}

impl TransactionProvider for CovalentClient {
    async fn fetch_transactions(
        &self,
        chain: &Chain,
        address: Address,
    ) -> Result<Vec<TransactionRecord>, ApiError> {
        let items: Vec<CovalentTransactionItem> = self
            .fetch_items(
                chain,
                address,
                "transactions_v3",
                &[("page-size", TRANSACTIONS_PAGE_SIZE), ("no-logs", "true")],
            )
            .await?;
        let total = items.len();
        let records: Vec<_> = items
            .into_iter()
            .filter_map(CovalentTransactionItem::into_record)
            .collect();
        if records.len() < total {
            debug!(
                chain_id = chain.id.chain_id(),
                skipped = total - records.len(),
                "skipped malformed Covalent transaction items"
            );
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        assert!(CovalentConfig::new("", "key", 10).is_err());
        assert!(CovalentConfig::new("not a url", "key", 10).is_err());
        assert!(CovalentConfig::new(DEFAULT_COVALENT_BASE_URL, "  ", 10).is_err());

        let config = CovalentConfig::new(DEFAULT_COVALENT_BASE_URL, "key", 0).unwrap();
        assert_eq!(config.timeout_seconds, DEFAULT_COVALENT_TIMEOUT_SECONDS);
    }

    #[test]
    fn envelope_tolerates_null_items() {
        let envelope: Envelope<ItemsPage<CovalentTokenItem>> = serde_json::from_str(
            r#"{"data": {"items": null}, "error": false, "error_message": null, "error_code": null}"#,
        )
        .unwrap();
        assert!(envelope.data.unwrap().items.is_none());
    }

    #[test]
    fn token_item_without_address_is_skipped() {
        let item: CovalentTokenItem =
            serde_json::from_str(r#"{"contract_address": null, "balance": "1", "quote": 1.0}"#)
                .unwrap();
        assert!(item.into_record().is_none());
    }

    #[test]
    fn wrong_typed_fields_read_as_absent() {
        let item: CovalentTokenItem = serde_json::from_str(
            r#"{
                "contract_address": "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
                "contract_ticker_symbol": "ETH",
                "contract_decimals": "eighteen",
                "native_token": "yes",
                "balance": "5",
                "quote": 12.5,
                "quote_24h": "n/a"
            }"#,
        )
        .unwrap();
        let record = item.into_record().unwrap();
        assert_eq!(record.symbol, "ETH");
        assert_eq!(record.decimals, 0);
        assert!(!record.is_native);
        assert!((record.quote - 12.5).abs() < f64::EPSILON);
        assert!(record.quote_24h.abs() < f64::EPSILON);
    }

    #[test]
    fn transaction_item_conversion() {
        let item: CovalentTransactionItem = serde_json::from_str(
            r#"{
                "tx_hash": "0xabc",
                "block_signed_at": "2024-03-01T12:00:00Z",
                "from_address": "0xd8da6bf26964af9d7eed9e03e53415d37aa96045",
                "to_address": null,
                "value": "1000000000000000000",
                "explorers": [{"label": null, "url": "https://etherscan.io/tx/0xabc"}]
            }"#,
        )
        .unwrap();
        let record = item.into_record().unwrap();
        assert_eq!(record.hash, "0xabc");
        assert!(record.to.is_none());
        assert_eq!(record.explorers.len(), 1);
        assert_eq!(record.explorers[0].label, "");
    }
}
