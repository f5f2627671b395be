// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical wallet entities produced by the aggregation layer

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Chain, ChainId};
use utoipa::ToSchema;

use crate::{NftRecord, TokenBalanceRecord, TransactionRecord};

/// Public gateway used to resolve avatar CIDs
pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs";

/// Fractional digits of a rendered transaction value
const TRANSACTION_VALUE_DIGITS: usize = 6;

/// A nonzero, quoted fungible balance on one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Chain the balance lives on
    pub chain_id: ChainId,
    /// Chain display name
    pub chain_name: String,
    /// Chain logo
    pub chain_logo_url: String,
    /// Token contract address
    #[schema(value_type = String)]
    pub contract_address: Address,
    /// Contract name
    pub name: Option<String>,
    /// Ticker symbol
    pub symbol: String,
    /// Decimals of the smallest unit
    pub decimals: u8,
    /// Whether this is the chain's native currency
    pub is_native: bool,
    /// Balance in the smallest unit
    pub balance_raw: String,
    /// Fiat value
    pub quote_value: f64,
    /// Fiat value 24 hours ago
    pub quote_24h_value: f64,
    /// Provider-formatted fiat value
    pub pretty_quote: String,
    /// Token logo
    pub logo_url: Option<String>,
}

impl Token {
    /// Tag an upstream record with the identity of `chain`
    pub fn from_record(chain: &Chain, record: TokenBalanceRecord) -> Self {
        let pretty_quote = record
            .pretty_quote
            .unwrap_or_else(|| format!("${:.2}", record.quote));
        Self {
            chain_id: chain.id,
            chain_name: chain.name.clone(),
            chain_logo_url: chain.logo_url.clone(),
            contract_address: record.contract_address,
            name: record.contract_name,
            symbol: record.symbol,
            decimals: record.decimals,
            is_native: record.is_native,
            balance_raw: record.balance_raw,
            quote_value: record.quote,
            quote_24h_value: record.quote_24h,
            pretty_quote,
            logo_url: record.logo_url,
        }
    }

    /// Balance converted to whole units: `raw / 10^decimals`
    pub fn balance_decimal(&self) -> f64 {
        let raw = self.balance_raw.parse::<f64>().unwrap_or(0.0);
        raw / 10f64.powi(i32::from(self.decimals))
    }
}

/// An owned NFT with a resolvable image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collectible {
    /// Chain the NFT lives on
    pub chain_id: ChainId,
    /// Chain display name
    pub chain_name: String,
    /// Chain logo
    pub chain_logo_url: String,
    /// Collection contract address
    #[schema(value_type = String)]
    pub contract_address: Address,
    /// Token identifier within the collection
    pub token_id: String,
    /// `{chainId}-{contract}-{tokenId}`
    pub unique_id: String,
    /// Display name
    pub name: String,
    /// Image reference
    pub image_url: String,
}

impl Collectible {
    /// Tag an upstream record with the identity of `chain`
    ///
    /// Returns `None` when the record has no image.
    pub fn from_record(chain: &Chain, record: NftRecord) -> Option<Self> {
        let image_url = record.image_url.filter(|url| !url.is_empty())?;
        let name = record
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("NFT #{}", record.token_id));
        Some(Self {
            chain_id: chain.id,
            chain_name: chain.name.clone(),
            chain_logo_url: chain.logo_url.clone(),
            unique_id: format!(
                "{}-{}-{}",
                chain.id.chain_id(),
                record.contract_address,
                record.token_id
            ),
            contract_address: record.contract_address,
            token_id: record.token_id,
            name,
            image_url,
        })
    }
}

/// Direction of a transaction relative to the queried address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The queried address is the sender
    Sent,
    /// Any other transaction involving the queried address
    Received,
}

/// Link to a block explorer page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExplorerRef {
    /// Page URL
    pub url: String,
    /// Explorer display label
    pub label: String,
}

/// A transaction involving the queried address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction hash
    pub hash: String,
    /// Block signing time
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
    /// Sender
    #[schema(value_type = String)]
    pub from: Address,
    /// Recipient
    #[schema(value_type = Option<String>)]
    pub to: Option<Address>,
    /// Native value in whole units with six fractional digits
    pub value: String,
    /// Sent or received
    pub direction: Direction,
    /// Chain the transaction lives on
    pub chain_id: ChainId,
    /// Chain display name
    pub chain_name: String,
    /// Chain logo
    pub chain_logo_url: String,
    /// First explorer link reported by the provider
    pub explorer: Option<ExplorerRef>,
}

impl Transaction {
    /// Tag an upstream record with the identity of `chain`, relative to `owner`
    pub fn from_record(chain: &Chain, record: TransactionRecord, owner: Address) -> Self {
        let direction = if record.from == owner {
            Direction::Sent
        } else {
            Direction::Received
        };
        let value = format_native_value(record.value_raw.as_deref(), chain.id.native_decimals());
        Self {
            hash: record.hash,
            timestamp: record.signed_at,
            from: record.from,
            to: record.to,
            value,
            direction,
            chain_id: chain.id,
            chain_name: chain.name.clone(),
            chain_logo_url: chain.logo_url.clone(),
            explorer: record.explorers.into_iter().next(),
        }
    }
}

fn format_native_value(raw: Option<&str>, decimals: u8) -> String {
    let raw = raw.and_then(|value| value.parse::<f64>().ok()).unwrap_or(0.0);
    let whole = raw / 10f64.powi(i32::from(decimals));
    format!("{:.*}", TRANSACTION_VALUE_DIGITS, whole)
}

/// A ranked user from the users list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Leaderboard position, ascending
    pub rank: u32,
    /// Wallet address
    pub address: String,
    /// Display name
    #[serde(default)]
    pub username: String,
    /// IPFS CID of the avatar image
    #[serde(default)]
    pub avatar_cid: Option<String>,
    /// Experience points
    #[serde(default)]
    pub xp: u64,
    /// Level
    #[serde(default)]
    pub level: u32,
    /// Consecutive days with activity
    #[serde(default)]
    pub gm_streak: u32,
}

impl User {
    /// Avatar URL through the public IPFS gateway
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar_cid
            .as_deref()
            .filter(|cid| !cid.is_empty())
            .map(|cid| format!("{IPFS_GATEWAY}/{cid}"))
    }
}

/// Value contributed by one chain to the multichain balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainBalance {
    /// Chain display name
    pub name: String,
    /// Chain logo
    pub logo_url: String,
    /// Summed fiat value of the chain's tokens
    pub value: f64,
}

/// Cross-chain balance summary derived from a token collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultichainBalance {
    /// Current fiat value across all chains
    pub total_value: f64,
    /// Fiat value 24 hours ago across all chains
    pub total_value_24h: f64,
    /// Relative change over 24 hours, in percent
    pub change_percent: f64,
    /// Chains with a positive value, in first-appearance order
    pub per_chain: Vec<ChainBalance>,
}
