// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Runtime chain registry
//!
//! The registry is the ordered set of chains every fan-out is issued against.
//! It is built once at startup and only read afterwards.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ChainId;

/// A chain as seen by the aggregation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    /// Numeric chain identifier
    pub id: ChainId,
    /// Display name
    pub name: String,
    /// Logo reference
    pub logo_url: String,
    /// Base URL of the NFT provider for this chain, absent when unsupported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_base_url: Option<String>,
}

impl Chain {
    /// Chain populated with the built-in display data for `id`
    pub fn builtin(id: ChainId) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            logo_url: id.logo_url().to_string(),
            nft_base_url: id.default_nft_base_url().map(str::to_string),
        }
    }

    /// Whether collectibles can be fetched for this chain
    pub fn supports_collectibles(&self) -> bool {
        self.nft_base_url.is_some()
    }
}

/// Ordered, immutable set of supported chains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRegistry {
    chains: Vec<Chain>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new(ChainId::all().iter().copied().map(Chain::builtin).collect())
    }
}

impl ChainRegistry {
    /// Registry over an explicit chain list; order is preserved
    pub fn new(chains: Vec<Chain>) -> Self {
        Self { chains }
    }

    /// Replace the NFT provider base URL of `id`, if the chain is registered
    #[must_use]
    pub fn with_nft_base_url(mut self, id: ChainId, base_url: impl Into<String>) -> Self {
        if let Some(chain) = self.chains.iter_mut().find(|chain| chain.id == id) {
            chain.nft_base_url = Some(base_url.into());
        }
        self
    }

    /// All chains in registry order
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Chains that expose an NFT provider, in registry order
    pub fn nft_chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter().filter(|chain| chain.supports_collectibles())
    }

    /// Lookup by identifier
    pub fn get(&self, id: ChainId) -> Option<&Chain> {
        self.chains.iter().find(|chain| chain.id == id)
    }

    /// Lookup by display name
    pub fn find_by_name(&self, name: &str) -> Option<&Chain> {
        self.chains.iter().find(|chain| chain.name == name)
    }

    /// Number of registered chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// True when no chain is registered
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_holds_builtin_chains_in_order() {
        let registry = ChainRegistry::default();
        let ids: Vec<_> = registry.chains().iter().map(|chain| chain.id).collect();
        assert_eq!(ids, ChainId::all());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn nft_chains_skip_unsupported() {
        let registry = ChainRegistry::default();
        let ids: Vec<_> = registry.nft_chains().map(|chain| chain.id).collect();
        assert_eq!(
            ids,
            vec![
                ChainId::Ethereum,
                ChainId::Optimism,
                ChainId::Base,
                ChainId::Arbitrum
            ]
        );
    }

    #[test]
    fn lookups() {
        let registry = ChainRegistry::default();
        assert_eq!(
            registry.find_by_name("Base").map(|chain| chain.id),
            Some(ChainId::Base)
        );
        assert!(registry.find_by_name("base").is_none());
        assert_eq!(
            registry.get(ChainId::Arbitrum).map(|chain| chain.name.as_str()),
            Some("Arbitrum")
        );
    }

    #[test]
    fn nft_base_url_override() {
        let registry =
            ChainRegistry::default().with_nft_base_url(ChainId::BnbSmartChain, "http://localhost:1");
        let bnb = registry.get(ChainId::BnbSmartChain).unwrap();
        assert_eq!(bnb.nft_base_url.as_deref(), Some("http://localhost:1"));
        assert_eq!(registry.nft_chains().count(), 5);
    }

    #[test]
    fn chain_serializes_camel_case() {
        let json = serde_json::to_value(Chain::builtin(ChainId::BnbSmartChain)).unwrap();
        assert_eq!(json["id"], 56);
        assert_eq!(json["name"], "BNB Smart Chain");
        assert!(json.get("nftBaseUrl").is_none());
        assert!(json.get("logoUrl").is_some());
    }
}
