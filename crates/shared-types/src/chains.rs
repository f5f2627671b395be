// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blockchain chain identifiers
//!
//! This module provides type-safe identifiers for the chains a wallet can be
//! inspected on, together with their static display data.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Chains a wallet can be inspected on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
pub enum ChainId {
    /// Ethereum mainnet
    Ethereum = 1,
    /// OP mainnet
    Optimism = 10,
    /// BNB Smart Chain, no NFT provider
    BnbSmartChain = 56,
    /// Base mainnet
    Base = 8453,
    /// Arbitrum One
    Arbitrum = 42161,
}

impl ChainId {
    /// Numeric EIP-155 id
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Optimism => 10,
            Self::BnbSmartChain => 56,
            Self::Base => 8453,
            Self::Arbitrum => 42161,
        }
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Optimism => "Optimism",
            Self::BnbSmartChain => "BNB Smart Chain",
            Self::Base => "Base",
            Self::Arbitrum => "Arbitrum",
        }
    }

    /// Returns the logo shown next to the chain name
    pub const fn logo_url(self) -> &'static str {
        match self {
            Self::Ethereum => "https://assets.coingecko.com/coins/images/279/standard/ethereum.png",
            Self::Optimism => {
                "https://assets.coingecko.com/coins/images/25244/standard/Optimism.png"
            }
            Self::BnbSmartChain => {
                "https://assets.coingecko.com/coins/images/825/standard/bnb-icon2_2x.png"
            }
            Self::Base => {
                "https://assets.coingecko.com/nft_contracts/images/2989/small_2x/base-introduced.png"
            }
            Self::Arbitrum => "https://assets.coingecko.com/coins/images/16547/standard/arb.jpg",
        }
    }

    /// Returns the default NFT provider base URL, if the provider indexes this chain
    pub const fn default_nft_base_url(self) -> Option<&'static str> {
        match self {
            Self::Ethereum => Some("https://eth-mainnet.g.alchemy.com"),
            Self::Optimism => Some("https://opt-mainnet.g.alchemy.com"),
            Self::Base => Some("https://base-mainnet.g.alchemy.com"),
            Self::Arbitrum => Some("https://arb-mainnet.g.alchemy.com"),
            Self::BnbSmartChain => None,
        }
    }

    /// Decimals of the chain's native currency
    pub const fn native_decimals(self) -> u8 {
        match self {
            Self::Ethereum | Self::Optimism | Self::BnbSmartChain | Self::Base | Self::Arbitrum => {
                18
            }
        }
    }

    /// Short names accepted when parsing
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Ethereum => &["eth"],
            Self::Optimism => &["op"],
            Self::BnbSmartChain => &["bnb", "bsc"],
            Self::Base => &[],
            Self::Arbitrum => &["arb"],
        }
    }

    /// Every supported chain, in display order
    pub const fn all() -> &'static [Self] {
        &[
            Self::Ethereum,
            Self::Optimism,
            Self::Base,
            Self::BnbSmartChain,
            Self::Arbitrum,
        ]
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ChainId {
    type Err = ChainIdParseError;

    /// Accepts the numeric id, the display name or a short alias, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u64>() {
            return Self::try_from(id);
        }

        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|chain| {
                chain.name().eq_ignore_ascii_case(wanted)
                    || chain
                        .aliases()
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| ChainIdParseError::InvalidName(s.to_string()))
    }
}

impl TryFrom<u64> for ChainId {
    type Error = ChainIdParseError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::all()
            .iter()
            .copied()
            .find(|chain| chain.chain_id() == id)
            .ok_or(ChainIdParseError::InvalidId(id))
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.chain_id().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChainIdVisitor;

        impl serde::de::Visitor<'_> for ChainIdVisitor {
            type Value = ChainId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "a valid chain ID (1, 10, 56, 8453, 42161) or name (Ethereum, Optimism, BNB Smart Chain, Base, Arbitrum)"
                )
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                ChainId::try_from(value).map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Unsigned(value),
                        &"a supported chain ID (1, 10, 56, 8453, 42161)",
                    )
                })
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                ChainId::from_str(value).map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Str(value),
                        &"a supported chain name (Ethereum, Optimism, BNB Smart Chain, Base, Arbitrum)",
                    )
                })
            }
        }

        deserializer.deserialize_any(ChainIdVisitor)
    }
}

/// A chain id or name outside the supported set
#[derive(Debug, thiserror::Error)]
pub enum ChainIdParseError {
    /// Numeric id of no supported chain
    #[error("unsupported chain id {0}")]
    InvalidId(u64),
    /// Name or alias of no supported chain
    #[error("unsupported chain name '{0}'")]
    InvalidName(String),
}
