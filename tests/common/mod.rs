//! Shared utilities for integration testing: an in-process ledger and a
//! server launcher.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cosmrs::AccountId;
use sha2::{Digest, Sha256};

use nft_gateway::config::GatewayConfig;
use nft_gateway::http::HttpServer;
use nft_gateway::ledger::codec::NftData;
use nft_gateway::ledger::messages::build_class_id;
use nft_gateway::ledger::types::{
    AccountInfo, BroadcastMode, GasEstimate, IdentityConfig, LedgerConfig, RpcError, TxResponse,
};
use nft_gateway::ledger::{LedgerHandle, LedgerMsg, LedgerRpc};
use nft_gateway::lifecycle::Shutdown;

pub const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Gas every simulation reports.
pub const SIMULATED_GAS: u64 = 80_000;

#[derive(Default)]
struct State {
    sequence: u64,
    height: i64,
    classes: HashSet<String>,
    /// (class id, nft id) → item data
    nfts: HashMap<(String, String), Vec<Vec<u8>>>,
    txs: HashMap<String, TxResponse>,
    lookups: HashMap<String, u32>,
    broadcasts: u32,
}

/// Ledger that executes asset NFT messages against in-memory state.
///
/// State changes apply when a transaction is accepted; lookups report it as
/// included after `inclusion_polls` pending answers.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<State>,
    /// Dry-run messages against state during simulation.
    strict_simulation: AtomicBool,
    /// Never report transactions as included.
    never_include: AtomicBool,
    inclusion_polls: AtomicU32,
    simulate_delay_ms: AtomicU64,
}

/// Codes loosely following the asset NFT module's error registry.
const CODE_CLASS_NOT_FOUND: u32 = 2;
const CODE_ALREADY_EXISTS: u32 = 3;
const CODE_NFT_NOT_FOUND: u32 = 4;
const CODE_SEQUENCE_MISMATCH: u32 = 32;

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_strict_simulation(&self, enabled: bool) {
        self.strict_simulation.store(enabled, Ordering::SeqCst);
    }

    pub fn set_never_include(&self, enabled: bool) {
        self.never_include.store(enabled, Ordering::SeqCst);
    }

    pub fn set_inclusion_polls(&self, polls: u32) {
        self.inclusion_polls.store(polls, Ordering::SeqCst);
    }

    /// Make every simulation take `delay` before answering.
    pub fn set_simulate_delay(&self, delay: Duration) {
        self.simulate_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn has_class(&self, class_id: &str) -> bool {
        self.state.lock().unwrap().classes.contains(class_id)
    }

    /// Data of item 0 of an NFT.
    pub fn nft_data(&self, class_id: &str, nft_id: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .nfts
            .get(&(class_id.to_string(), nft_id.to_string()))
            .and_then(|items| items.first().cloned())
    }

    pub fn nft_count(&self) -> usize {
        self.state.lock().unwrap().nfts.len()
    }

    pub fn broadcasts(&self) -> u32 {
        self.state.lock().unwrap().broadcasts
    }

    fn decode(tx_bytes: &[u8]) -> Result<(u64, LedgerMsg), RpcError> {
        let tx = cosmrs::Tx::from_bytes(tx_bytes).map_err(|e| RpcError::Decode(e.to_string()))?;
        let sequence = tx.auth_info.signer_infos[0].sequence;
        let any = &tx.body.messages[0];
        let msg = LedgerMsg::from_any(&any.type_url, &any.value)
            .map_err(|e| RpcError::Decode(e.to_string()))?;
        Ok((sequence, msg))
    }

    /// Outcome of `msg` against `state`; applies it when `commit` is set.
    fn execute(state: &mut State, msg: &LedgerMsg, commit: bool) -> Result<(), (u32, String)> {
        match msg {
            LedgerMsg::IssueClass(m) => {
                let issuer: AccountId = m.issuer.parse().map_err(|_| (1, "bad issuer".to_string()))?;
                let class_id = build_class_id(&m.symbol, &issuer);
                if state.classes.contains(&class_id) {
                    return Err((CODE_ALREADY_EXISTS, format!("class {} already exists", class_id)));
                }
                if commit {
                    state.classes.insert(class_id);
                }
            }
            LedgerMsg::Mint(m) => {
                if !state.classes.contains(&m.class_id) {
                    return Err((CODE_CLASS_NOT_FOUND, format!("class {} not found", m.class_id)));
                }
                let key = (m.class_id.clone(), m.id.clone());
                if state.nfts.contains_key(&key) {
                    return Err((CODE_ALREADY_EXISTS, format!("nft {} already exists", m.id)));
                }
                let items = match m.data.as_ref().map(NftData::from_any) {
                    Some(Ok(NftData::Dynamic(dynamic))) => {
                        if dynamic.items.iter().any(|item| item.editors.is_empty()) {
                            return Err((1, "data item without editors".to_string()));
                        }
                        dynamic.items.into_iter().map(|item| item.data).collect()
                    }
                    Some(Ok(NftData::Bytes(bytes))) => vec![bytes.data],
                    Some(Err(e)) => return Err((1, e.to_string())),
                    None => Vec::new(),
                };
                if commit {
                    state.nfts.insert(key, items);
                }
            }
            LedgerMsg::UpdateData(m) => {
                let key = (m.class_id.clone(), m.id.clone());
                let Some(items) = state.nfts.get_mut(&key) else {
                    return Err((CODE_NFT_NOT_FOUND, format!("nft {}/{} not found", m.class_id, m.id)));
                };
                for update in &m.items {
                    let index = update.index as usize;
                    if index >= items.len() {
                        return Err((1, format!("item {} out of range", index)));
                    }
                    if commit {
                        items[index] = update.data.clone();
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn account(&self, _address: &str) -> Result<AccountInfo, RpcError> {
        let state = self.state.lock().unwrap();
        Ok(AccountInfo {
            account_number: 1,
            sequence: state.sequence,
        })
    }

    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<GasEstimate, RpcError> {
        let delay = self.simulate_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let (_, msg) = Self::decode(&tx_bytes)?;
        if self.strict_simulation.load(Ordering::SeqCst) {
            let mut state = self.state.lock().unwrap();
            Self::execute(&mut state, &msg, false).map_err(|(_, log)| RpcError::Status {
                code: "Unknown".into(),
                message: log,
            })?;
        }
        Ok(GasEstimate {
            gas_wanted: 0,
            gas_used: SIMULATED_GAS,
        })
    }

    async fn broadcast_tx(
        &self,
        tx_bytes: Vec<u8>,
        _mode: BroadcastMode,
    ) -> Result<TxResponse, RpcError> {
        let (sequence, msg) = Self::decode(&tx_bytes)?;
        let txhash = hex::encode_upper(Sha256::digest(&tx_bytes));

        let mut state = self.state.lock().unwrap();
        state.broadcasts += 1;

        if sequence != state.sequence {
            return Ok(TxResponse {
                txhash,
                code: CODE_SEQUENCE_MISMATCH,
                codespace: "sdk".into(),
                raw_log: format!("account sequence mismatch, expected {}, got {}", state.sequence, sequence),
                ..Default::default()
            });
        }
        state.sequence += 1;
        state.height += 1;

        let (code, raw_log) = match Self::execute(&mut state, &msg, true) {
            Ok(()) => (0, String::new()),
            Err((code, log)) => (code, log),
        };
        let included = TxResponse {
            txhash: txhash.clone(),
            height: state.height,
            code,
            codespace: if code == 0 { String::new() } else { "nft".into() },
            raw_log,
            gas_wanted: 100_000,
            gas_used: SIMULATED_GAS as i64,
        };
        state.txs.insert(txhash.clone(), included);

        Ok(TxResponse {
            txhash,
            ..Default::default()
        })
    }

    async fn get_tx(&self, txhash: &str) -> Result<Option<TxResponse>, RpcError> {
        if self.never_include.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut state = self.state.lock().unwrap();
        let polls = state.lookups.entry(txhash.to_string()).or_insert(0);
        *polls += 1;
        if *polls <= self.inclusion_polls.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(state.txs.get(txhash).cloned())
    }
}

/// Ledger settings suited to the mock: fast polling, short deadline.
pub fn ledger_config() -> LedgerConfig {
    LedgerConfig {
        poll_interval_ms: 10,
        confirmation_timeout_secs: 2,
        ..LedgerConfig::default()
    }
}

pub fn identity_config() -> IdentityConfig {
    IdentityConfig {
        mnemonic: Some(TEST_MNEMONIC.to_string()),
        ..IdentityConfig::default()
    }
}

pub fn handle(mock: Arc<MockLedger>) -> LedgerHandle {
    LedgerHandle::from_rpc(mock, &ledger_config(), &mut identity_config()).unwrap()
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(mut config: GatewayConfig, ledger: LedgerHandle) -> (SocketAddr, Shutdown) {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, ledger);
    let token = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, token).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}
