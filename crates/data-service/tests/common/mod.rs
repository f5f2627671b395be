// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs, dead_code)]

//! In-memory providers for the aggregation and service tests

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use alloy_primitives::{Address, address};
use api_client::{
    ApiError, CollectibleProvider, ExplorerRef, NftRecord, TokenBalanceRecord, TokenProvider,
    TransactionProvider, TransactionRecord, UpstreamClient, User, UserListProvider,
};
use chrono::{DateTime, TimeZone, Utc};
use data_service::{
    DataService, Providers, RetryPolicy, ServiceConfig, TracingObserver,
};
use shared_types::{Chain, ChainId, ChainRegistry};
use tokio_util::sync::CancellationToken;

pub const OWNER: Address = address!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
pub const OTHER: Address = address!("0x00000000219ab540356cbb839cbe05303d7705fa");

/// Per-chain canned answer: records or an HTTP status to fail with
type Answer<T> = Result<Vec<T>, u16>;

fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        message: format!("mock failure {status}"),
    }
}

fn answer<T: Clone>(
    answers: &Mutex<HashMap<ChainId, Answer<T>>>,
    chain: ChainId,
) -> Result<Vec<T>, ApiError> {
    let answers = answers.lock().unwrap();
    match answers.get(&chain) {
        Some(Ok(records)) => Ok(records.clone()),
        Some(Err(status)) => Err(status_error(*status)),
        None => Ok(Vec::new()),
    }
}

/// Token balances and transactions keyed by chain
#[derive(Debug, Default)]
pub struct MockBalances {
    tokens: Mutex<HashMap<ChainId, Answer<TokenBalanceRecord>>>,
    transactions: Mutex<HashMap<ChainId, Answer<TransactionRecord>>>,
    delays: Mutex<HashMap<ChainId, Duration>>,
    pub token_calls: AtomicUsize,
    pub transaction_calls: AtomicUsize,
}

impl MockBalances {
    pub fn set_tokens(&self, chain: ChainId, records: Vec<TokenBalanceRecord>) {
        self.tokens.lock().unwrap().insert(chain, Ok(records));
    }

    pub fn fail_tokens(&self, chain: ChainId, status: u16) {
        self.tokens.lock().unwrap().insert(chain, Err(status));
    }

    pub fn set_transactions(&self, chain: ChainId, records: Vec<TransactionRecord>) {
        self.transactions.lock().unwrap().insert(chain, Ok(records));
    }

    pub fn fail_transactions(&self, chain: ChainId, status: u16) {
        self.transactions.lock().unwrap().insert(chain, Err(status));
    }

    pub fn set_delay(&self, chain: ChainId, delay: Duration) {
        self.delays.lock().unwrap().insert(chain, delay);
    }

    pub fn set_delay_all(&self, delay: Duration) {
        for chain in ChainId::all() {
            self.set_delay(*chain, delay);
        }
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn transaction_calls(&self) -> usize {
        self.transaction_calls.load(Ordering::SeqCst)
    }

    fn delay(&self, chain: ChainId) -> Duration {
        self.delays
            .lock()
            .unwrap()
            .get(&chain)
            .copied()
            .unwrap_or_default()
    }
}

impl UpstreamClient for MockBalances {
    fn name(&self) -> &'static str {
        "mock-balances"
    }
}

impl TokenProvider for MockBalances {
    async fn fetch_token_balances(
        &self,
        chain: &Chain,
        _address: Address,
    ) -> Result<Vec<TokenBalanceRecord>, ApiError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay(chain.id)).await;
        answer(&self.tokens, chain.id)
    }
}

impl TransactionProvider for MockBalances {
    async fn fetch_transactions(
        &self,
        chain: &Chain,
        _address: Address,
    ) -> Result<Vec<TransactionRecord>, ApiError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay(chain.id)).await;
        answer(&self.transactions, chain.id)
    }
}

/// Owned NFTs keyed by chain
#[derive(Debug, Default)]
pub struct MockNfts {
    nfts: Mutex<HashMap<ChainId, Answer<NftRecord>>>,
    pub calls: AtomicUsize,
    pub chains_seen: Mutex<Vec<ChainId>>,
}

impl MockNfts {
    pub fn set_nfts(&self, chain: ChainId, records: Vec<NftRecord>) {
        self.nfts.lock().unwrap().insert(chain, Ok(records));
    }

    pub fn fail(&self, chain: ChainId, status: u16) {
        self.nfts.lock().unwrap().insert(chain, Err(status));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UpstreamClient for MockNfts {
    fn name(&self) -> &'static str {
        "mock-nfts"
    }
}

impl CollectibleProvider for MockNfts {
    async fn fetch_owned_nfts(
        &self,
        chain: &Chain,
        _owner: Address,
    ) -> Result<Vec<NftRecord>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chains_seen.lock().unwrap().push(chain.id);
        answer(&self.nfts, chain.id)
    }
}

/// How the mocked users list fails
#[derive(Debug, Clone, Copy)]
pub enum UsersFailure {
    Status(u16),
    Malformed,
}

impl From<UsersFailure> for ApiError {
    fn from(failure: UsersFailure) -> Self {
        match failure {
            UsersFailure::Status(status) => status_error(status),
            UsersFailure::Malformed => ApiError::Decode {
                message: "expected array".to_string(),
            },
        }
    }
}

/// Users list answering with a fixed list or a failure
#[derive(Debug)]
pub struct MockUsers {
    answer: Mutex<Result<Vec<User>, UsersFailure>>,
    pub calls: AtomicUsize,
}

impl Default for MockUsers {
    fn default() -> Self {
        Self {
            answer: Mutex::new(Ok(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockUsers {
    pub fn set_users(&self, users: Vec<User>) {
        *self.answer.lock().unwrap() = Ok(users);
    }

    pub fn fail(&self, status: u16) {
        self.fail_with(UsersFailure::Status(status));
    }

    pub fn fail_with(&self, failure: UsersFailure) {
        *self.answer.lock().unwrap() = Err(failure);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UpstreamClient for MockUsers {
    fn name(&self) -> &'static str {
        "mock-users"
    }
}

impl UserListProvider for MockUsers {
    async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.lock().unwrap().clone().map_err(ApiError::from)
    }
}

pub fn token(contract: u8, quote: f64, quote_24h: f64) -> TokenBalanceRecord {
    TokenBalanceRecord {
        contract_address: Address::repeat_byte(contract),
        contract_name: Some(format!("Token {contract}")),
        symbol: format!("T{contract}"),
        decimals: 18,
        is_native: false,
        balance_raw: "1000000000000000000".to_string(),
        quote,
        quote_24h,
        pretty_quote: None,
        logo_url: None,
    }
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(minute.into())
}

pub fn transaction(hash: &str, signed_at: DateTime<Utc>) -> TransactionRecord {
    TransactionRecord {
        hash: hash.to_string(),
        signed_at,
        from: OWNER,
        to: Some(OTHER),
        value_raw: Some("1000000000000000000".to_string()),
        explorers: vec![ExplorerRef {
            url: format!("https://explorer/tx/{hash}"),
            label: "Explorer".to_string(),
        }],
    }
}

pub fn nft(token_id: &str, name: Option<&str>, image: Option<&str>) -> NftRecord {
    NftRecord {
        contract_address: OTHER,
        token_id: token_id.to_string(),
        name: name.map(str::to_string),
        image_url: image.map(str::to_string),
    }
}

pub fn user(rank: u32, username: &str) -> User {
    User {
        rank,
        address: format!("0x{rank:040x}"),
        username: username.to_string(),
        avatar_cid: None,
        xp: 10,
        level: 1,
        gm_streak: 0,
    }
}

/// Built-in chains, with test NFT endpoints on every chain that has one
pub fn registry() -> Arc<ChainRegistry> {
    Arc::new(ChainRegistry::default())
}

/// Windows long enough to never expire during a test and instant retries
pub fn fast_config() -> ServiceConfig {
    ServiceConfig {
        retry: RetryPolicy {
            max_retries: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        },
        ..ServiceConfig::default()
    }
}

pub struct Harness {
    pub balances: Arc<MockBalances>,
    pub nfts: Arc<MockNfts>,
    pub users: Arc<MockUsers>,
    pub shutdown: CancellationToken,
    pub service: Arc<DataService<MockBalances, MockNfts, MockUsers>>,
}

impl Harness {
    pub fn new(config: ServiceConfig) -> Self {
        let balances = Arc::new(MockBalances::default());
        let nfts = Arc::new(MockNfts::default());
        let users = Arc::new(MockUsers::default());
        let shutdown = CancellationToken::new();
        let service = Arc::new(DataService::new(
            Providers {
                balances: Arc::clone(&balances),
                nfts: Arc::clone(&nfts),
                users: Arc::clone(&users),
            },
            registry(),
            config,
            Arc::new(TracingObserver),
            shutdown.clone(),
        ));
        Self {
            balances,
            nfts,
            users,
            shutdown,
            service,
        }
    }
}
