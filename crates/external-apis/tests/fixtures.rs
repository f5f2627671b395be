// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Upstream payload fixtures for the client integration tests

use alloy_primitives::{Address, address};
use serde_json::{Value, json};

pub const OWNER: Address = address!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
pub const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
pub const NATIVE: Address = address!("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");
pub const COLLECTION: Address = address!("0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d");

/// Covalent `balances_v2` body with a native balance, a token and a zero balance
pub fn covalent_balances() -> Value {
    json!({
        "data": {
            "address": OWNER.to_string().to_lowercase(),
            "chain_id": 1,
            "items": [
                {
                    "contract_decimals": 18,
                    "contract_name": "Ether",
                    "contract_ticker_symbol": "ETH",
                    "contract_address": NATIVE.to_string().to_lowercase(),
                    "native_token": true,
                    "balance": "1500000000000000000",
                    "quote": 4500.0,
                    "quote_24h": 4400.0,
                    "pretty_quote": "$4,500.00",
                    "logo_url": "https://logos/eth.png"
                },
                {
                    "contract_decimals": 6,
                    "contract_name": "USD Coin",
                    "contract_ticker_symbol": "USDC",
                    "contract_address": USDC.to_string().to_lowercase(),
                    "native_token": false,
                    "balance": "2500000",
                    "quote": 2.5,
                    "quote_24h": null,
                    "pretty_quote": "$2.50",
                    "logo_url": null
                },
                {
                    "contract_decimals": 18,
                    "contract_name": "Broken",
                    "contract_ticker_symbol": "BRK",
                    "contract_address": "not-an-address",
                    "balance": "1",
                    "quote": 1.0
                }
            ]
        },
        "error": false,
        "error_message": null,
        "error_code": null
    })
}

/// Covalent `transactions_v3` body with `count` transactions one minute apart
pub fn covalent_transactions(count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "block_signed_at": format!("2024-03-01T12:{:02}:00Z", i % 60),
                "tx_hash": format!("0x{i:064x}"),
                "from_address": OWNER.to_string().to_lowercase(),
                "to_address": USDC.to_string().to_lowercase(),
                "value": "1000000000000000000",
                "explorers": [{"label": "Etherscan", "url": format!("https://etherscan.io/tx/{i}")}]
            })
        })
        .collect();
    json!({
        "data": {"items": items},
        "error": false,
        "error_message": null,
        "error_code": null
    })
}

/// Covalent envelope reporting an error with a 200 status
pub fn covalent_error() -> Value {
    json!({
        "data": null,
        "error": true,
        "error_message": "Malformed address provided",
        "error_code": 400
    })
}

/// Alchemy `getNFTsForOwner` body with `count` NFTs, every third one without image
pub fn alchemy_owned_nfts(count: usize) -> Value {
    let nfts: Vec<Value> = (0..count)
        .map(|i| {
            let image = if i % 3 == 2 {
                Value::Null
            } else {
                json!({"thumbnailUrl": format!("https://thumb/{i}.png"), "cachedUrl": null, "originalUrl": null})
            };
            json!({
                "contract": {"address": COLLECTION.to_string().to_lowercase()},
                "tokenId": i.to_string(),
                "name": format!("Ape #{i}"),
                "title": null,
                "image": image
            })
        })
        .collect();
    json!({"ownedNfts": nfts, "totalCount": count})
}

/// Users list body in non-rank order
pub fn users_list() -> Value {
    json!({
        "users": [
            {"rank": 2, "address": "0x02", "username": "bob", "avatarCid": "cid-b", "xp": 50, "level": 3, "gmStreak": 1},
            {"rank": 1, "address": "0x01", "username": "alice", "avatarCid": "cid-a", "xp": 90, "level": 5, "gmStreak": 7}
        ]
    })
}
