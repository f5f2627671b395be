// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Alchemy NFT API integration
//!
//! Alchemy is reached through a per-chain base URL taken from the chain
//! registry; chains without one are never queried.

use alloy_primitives::Address;
use api_client::{ApiError, CollectibleProvider, NftRecord, UpstreamClient};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{DefaultOnError, DefaultOnNull, serde_as};
use shared_types::{Chain, ChainId};
use thiserror::Error;
use tracing::debug;

use crate::{
    http::{HttpFailure, build_client, decode_each, get_json},
    non_empty_string::NonEmptyString,
};

const DEFAULT_ALCHEMY_TIMEOUT_SECONDS: u64 = 20;
/// Owned NFTs requested and kept per chain
pub const MAX_NFTS_PER_CHAIN: usize = 20;

/// Configuration for the Alchemy API client
#[derive(Debug, Clone)]
pub struct AlchemyConfig {
    /// API key, part of the request path
    pub api_key: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl AlchemyConfig {
    /// Create a new `AlchemyConfig` with validation
    pub fn new(api_key: impl Into<String>, timeout_seconds: u64) -> Result<Self, AlchemyError> {
        let api_key = NonEmptyString::new(api_key)
            .map_err(|_| AlchemyError::Config("API key cannot be empty".to_string()))?;
        Ok(Self {
            api_key,
            timeout_seconds: if timeout_seconds == 0 {
                DEFAULT_ALCHEMY_TIMEOUT_SECONDS
            } else {
                timeout_seconds
            },
        })
    }
}

/// Errors specific to the Alchemy API client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum AlchemyError {
    /// Request level failure
    #[error(transparent)]
    Request(#[from] HttpFailure),

    /// HTTP client could not be built
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    /// The chain has no NFT base URL
    #[error("chain {0} has no NFT provider")]
    UnsupportedChain(ChainId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<AlchemyError> for ApiError {
    fn from(value: AlchemyError) -> Self {
        match value {
            AlchemyError::Request(failure) => failure.into(),
            AlchemyError::Client(error) => ApiError::Configuration {
                message: error.to_string(),
            },
            error @ AlchemyError::UnsupportedChain(_) => ApiError::Configuration {
                message: error.to_string(),
            },
            AlchemyError::Config(message) => ApiError::Configuration { message },
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedNftsResponse {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    owned_nfts: Vec<Value>,
}

/// Owned NFT; `contract` and `tokenId` are required, other fields of the
/// wrong type read as absent
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlchemyNft {
    contract: AlchemyContract,
    token_id: String,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    name: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    title: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    image: Option<AlchemyImage>,
}

#[derive(Debug, Deserialize)]
struct AlchemyContract {
    address: String,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AlchemyImage {
    #[serde_as(as = "DefaultOnError")]
    thumbnail_url: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    cached_url: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    original_url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl AlchemyNft {
    fn into_record(self) -> Option<NftRecord> {
        let contract_address = self.contract.address.parse().ok()?;
        let image_url = self.image.and_then(|image| {
            non_empty(image.thumbnail_url)
                .or_else(|| non_empty(image.cached_url))
                .or_else(|| non_empty(image.original_url))
        });
        Some(NftRecord {
            contract_address,
            token_id: self.token_id,
            name: non_empty(self.name).or_else(|| non_empty(self.title)),
            image_url,
        })
    }
}

/// Alchemy NFT API client implementation
#[derive(Debug)]
pub struct AlchemyClient {
    client: Client,
    config: AlchemyConfig,
}

impl AlchemyClient {
    /// Create a new Alchemy API client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: AlchemyConfig) -> Result<Self, AlchemyError> {
        let client = build_client(config.timeout_seconds)?;
        Ok(Self { client, config })
    }

    async fn owned_nfts(&self, chain: &Chain, owner: Address) -> Result<Vec<NftRecord>, AlchemyError> {
        let base_url = chain
            .nft_base_url
            .as_deref()
            .ok_or(AlchemyError::UnsupportedChain(chain.id))?;

        // the key is part of the path, so the URL itself is not logged
        let url = format!(
            "{}/nft/v3/{}/getNFTsForOwner",
            base_url.trim_end_matches('/'),
            self.config.api_key
        );
        debug!(chain_id = chain.id.chain_id(), %owner, "fetching owned NFTs from Alchemy");

        let page_size = MAX_NFTS_PER_CHAIN.to_string();
        let request = self.client.get(&url).query(&[
            ("owner", owner.to_string().as_str()),
            ("withMetadata", "true"),
            ("pageSize", page_size.as_str()),
        ]);

        let response: OwnedNftsResponse =
            get_json(request, self.config.timeout_seconds, self.name()).await?;

        let mut owned = response.owned_nfts;
        owned.truncate(MAX_NFTS_PER_CHAIN);
        Ok(decode_each::<AlchemyNft>(owned, self.name())
            .into_iter()
            .filter_map(AlchemyNft::into_record)
            .collect())
    }
}

impl UpstreamClient for AlchemyClient {
    fn name(&self) -> &'static str {
        "alchemy"
    }
}

impl CollectibleProvider for AlchemyClient {
    async fn fetch_owned_nfts(&self, chain: &Chain, owner: Address) -> Result<Vec<NftRecord>, ApiError> {
        Ok(self.owned_nfts(chain, owner).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_and_name_fallbacks() {
        let nft: AlchemyNft = serde_json::from_value(serde_json::json!({
            "contract": {"address": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"},
            "tokenId": "7",
            "name": "",
            "title": "Title Seven",
            "image": {"thumbnailUrl": "", "cachedUrl": null, "originalUrl": "ipfs://seven"}
        }))
        .unwrap();
        let record = nft.into_record().unwrap();
        assert_eq!(record.name.as_deref(), Some("Title Seven"));
        assert_eq!(record.image_url.as_deref(), Some("ipfs://seven"));
    }

    #[test]
    fn missing_image_object() {
        let nft: AlchemyNft = serde_json::from_value(serde_json::json!({
            "contract": {"address": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"},
            "tokenId": "8"
        }))
        .unwrap();
        let record = nft.into_record().unwrap();
        assert!(record.image_url.is_none());
        assert!(record.name.is_none());
    }

    #[test]
    fn wrong_typed_metadata_reads_as_absent() {
        let nft: AlchemyNft = serde_json::from_value(serde_json::json!({
            "contract": {"address": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"},
            "tokenId": "9",
            "name": 9,
            "image": {"thumbnailUrl": false, "cachedUrl": "https://cached/9.png"}
        }))
        .unwrap();
        let record = nft.into_record().unwrap();
        assert!(record.name.is_none());
        assert_eq!(record.image_url.as_deref(), Some("https://cached/9.png"));
    }

    #[test]
    fn nft_without_token_id_does_not_decode() {
        let decoded = decode_each::<AlchemyNft>(
            vec![serde_json::json!({
                "contract": {"address": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d"}
            })],
            "alchemy",
        );
        assert!(decoded.is_empty());
    }

    #[test]
    fn empty_api_key_rejected() {
        assert!(AlchemyConfig::new("", 10).is_err());
    }
}
