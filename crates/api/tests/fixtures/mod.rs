// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! Upstream mock servers and payloads for the end-to-end HTTP tests

use std::net::SocketAddr;

use alloy_primitives::{Address, address};
use api::{Server, ServerConfig, ShutdownConfig};
use serde_json::{Value, json};
use shared_types::ChainId;
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const OWNER: Address = address!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
pub const EMPTY_WALLET: Address = address!("0x00000000219ab540356cbb839cbe05303d7705fa");
pub const NATIVE: Address = address!("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");
pub const COLLECTION: Address = address!("0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d");

const ALCHEMY_KEY: &str = "test-alchemy-key";

/// One mock server per upstream provider
///
/// Unmatched requests answer 404, so a chain without a mounted mock fails
/// and is reported as such.
pub struct Upstreams {
    pub covalent: MockServer,
    pub nfts: MockServer,
    pub users: MockServer,
}

impl Upstreams {
    pub async fn start() -> Self {
        Self {
            covalent: MockServer::start().await,
            nfts: MockServer::start().await,
            users: MockServer::start().await,
        }
    }

    /// Testing configuration pointing every provider at the mock servers
    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::for_testing();
        config.providers.covalent.base_url = self.covalent.uri();
        config.providers.users.endpoint = format!("{}/users", self.users.uri());
        for chain in [
            ChainId::Ethereum,
            ChainId::Optimism,
            ChainId::Base,
            ChainId::Arbitrum,
        ] {
            config
                .providers
                .alchemy
                .base_urls
                .insert(chain.chain_id().to_string(), self.nfts.uri());
        }
        config
    }

    /// Start the API server against the mock providers
    pub async fn spawn_server(&self) -> TestServer {
        let server = Server::new(self.config(), ShutdownConfig::default()).unwrap();
        let (addr, shutdown) = server.run_for_testing().await.unwrap();
        TestServer {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        }
    }

    pub async fn mount_balances(&self, chain: ChainId, owner: Address, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/{}/address/{owner}/balances_v2/", chain.chain_id())))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.covalent)
            .await;
    }

    pub async fn mount_transactions(&self, chain: ChainId, owner: Address, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/{}/address/{owner}/transactions_v3/", chain.chain_id())))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.covalent)
            .await;
    }

    /// Every NFT chain shares the mock server, so each one answers `body`
    pub async fn mount_nfts(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/nft/v3/{ALCHEMY_KEY}/getNFTsForOwner")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.nfts)
            .await;
    }
}

/// Running API server
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, route: &str) -> String {
        format!("http://{}{route}", self.addr)
    }

    pub async fn get(&self, route: &str) -> reqwest::Response {
        self.client.get(self.url(route)).send().await.unwrap()
    }

    pub async fn get_json(&self, route: &str) -> Value {
        let response = self.get(route).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {route}");
        response.json().await.unwrap()
    }

    pub async fn post(&self, route: &str) -> reqwest::Response {
        self.client.post(self.url(route)).send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn envelope(items: Vec<Value>) -> Value {
    json!({
        "data": {"items": items},
        "error": false,
        "error_message": null,
        "error_code": null
    })
}

/// `balances_v2` item
pub fn balance_item(contract: Address, symbol: &str, quote: f64, quote_24h: f64) -> Value {
    json!({
        "contract_decimals": 18,
        "contract_name": symbol,
        "contract_ticker_symbol": symbol,
        "contract_address": contract.to_string().to_lowercase(),
        "native_token": contract == NATIVE,
        "balance": "1000000000000000000",
        "quote": quote,
        "quote_24h": quote_24h,
        "pretty_quote": format!("${quote:.2}"),
        "logo_url": null
    })
}

pub fn balances(items: Vec<Value>) -> Value {
    envelope(items)
}

/// `transactions_v3` body with `count` transactions `offset` minutes apart
pub fn transactions(count: usize, offset: usize) -> Value {
    envelope(
        (0..count)
            .map(|i| {
                let minute = i + offset;
                json!({
                    "block_signed_at": format!("2024-03-01T{:02}:{:02}:00Z", minute / 60, minute % 60),
                    "tx_hash": format!("0x{minute:064x}"),
                    "from_address": OWNER.to_string().to_lowercase(),
                    "to_address": COLLECTION.to_string().to_lowercase(),
                    "value": "1000000000000000000",
                    "explorers": [{"label": "Explorer", "url": format!("https://explorer/tx/{minute}")}]
                })
            })
            .collect(),
    )
}

/// `getNFTsForOwner` body; entries without image are dropped by the service
pub fn owned_nfts(names: &[(&str, bool)]) -> Value {
    let nfts: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, (name, with_image))| {
            let image = if *with_image {
                json!({"thumbnailUrl": format!("https://thumb/{i}.png"), "cachedUrl": null, "originalUrl": null})
            } else {
                Value::Null
            };
            json!({
                "contract": {"address": COLLECTION.to_string().to_lowercase()},
                "tokenId": i.to_string(),
                "name": name,
                "title": null,
                "image": image
            })
        })
        .collect();
    json!({"ownedNfts": nfts, "totalCount": names.len()})
}

pub fn users_list() -> Value {
    json!({
        "users": [
            {"rank": 3, "address": "0x03", "username": "carol", "avatarCid": null, "xp": 10, "level": 1, "gmStreak": 0},
            {"rank": 1, "address": "0x01", "username": "alice", "avatarCid": "cid-a", "xp": 90, "level": 5, "gmStreak": 7},
            {"rank": 2, "address": "0x02", "username": "bob", "avatarCid": "cid-b", "xp": 50, "level": 3, "gmStreak": 1}
        ]
    })
}
