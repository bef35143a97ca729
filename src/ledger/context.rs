//! Client context and transaction factory.
//!
//! Both are immutable values: every `with_*` call consumes the value and
//! returns a new one with a single field replaced. Shared parts (RPC handle,
//! keyring, registry, sequencer) sit behind `Arc`, so cloning is cheap and
//! never aliases mutable state.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cosmrs::AccountId;
use tokio::sync::{Mutex, MutexGuard};

use crate::ledger::codec::EncodingRegistry;
use crate::ledger::identity::Keyring;
use crate::ledger::rpc::LedgerRpc;
use crate::ledger::types::{BroadcastMode, ChainId};
use crate::lifecycle::ShutdownToken;

/// Serializes "query sequence → sign → submit" for one account.
///
/// Holds the next sequence expected after the last accepted submission, since
/// the node only reports committed state.
#[derive(Debug, Default)]
pub struct Sequencer {
    next: Mutex<Option<u64>>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, Option<u64>> {
        self.next.lock().await
    }
}

/// Everything the broadcast pipeline needs to talk to the ledger.
#[derive(Clone)]
pub struct ClientContext {
    chain_id: Option<ChainId>,
    rpc: Option<Arc<dyn LedgerRpc>>,
    keyring: Option<Arc<Keyring>>,
    registry: Arc<EncodingRegistry>,
    broadcast_mode: BroadcastMode,
    await_tx: bool,
    from_address: Option<AccountId>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    /// Budget for a whole pipeline run, sequencer wait included.
    deadline: Option<Duration>,
    cancellation: Option<ShutdownToken>,
    sequencer: Arc<Sequencer>,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            chain_id: None,
            rpc: None,
            keyring: None,
            registry: Arc::new(EncodingRegistry::asset_nft()),
            broadcast_mode: BroadcastMode::Sync,
            await_tx: false,
            from_address: None,
            confirmation_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            deadline: None,
            cancellation: None,
            sequencer: Arc::new(Sequencer::new()),
        }
    }
}

impl ClientContext {
    pub fn new(registry: EncodingRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_chain_id(self, chain_id: ChainId) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..self
        }
    }

    #[must_use]
    pub fn with_rpc(self, rpc: Arc<dyn LedgerRpc>) -> Self {
        Self {
            rpc: Some(rpc),
            ..self
        }
    }

    #[must_use]
    pub fn with_keyring(self, keyring: Arc<Keyring>) -> Self {
        Self {
            keyring: Some(keyring),
            ..self
        }
    }

    #[must_use]
    pub fn with_broadcast_mode(self, broadcast_mode: BroadcastMode) -> Self {
        Self {
            broadcast_mode,
            ..self
        }
    }

    #[must_use]
    pub fn with_await_tx(self, await_tx: bool) -> Self {
        Self { await_tx, ..self }
    }

    #[must_use]
    pub fn with_from_address(self, from_address: AccountId) -> Self {
        Self {
            from_address: Some(from_address),
            ..self
        }
    }

    #[must_use]
    pub fn with_confirmation_timeout(self, confirmation_timeout: Duration) -> Self {
        Self {
            confirmation_timeout,
            ..self
        }
    }

    #[must_use]
    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    #[must_use]
    pub fn with_deadline(self, deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..self
        }
    }

    #[must_use]
    pub fn with_cancellation(self, token: ShutdownToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self
        }
    }

    pub fn chain_id(&self) -> Option<&ChainId> {
        self.chain_id.as_ref()
    }

    pub fn rpc(&self) -> Option<&Arc<dyn LedgerRpc>> {
        self.rpc.as_ref()
    }

    pub fn keyring(&self) -> Option<&Arc<Keyring>> {
        self.keyring.as_ref()
    }

    pub fn registry(&self) -> &EncodingRegistry {
        &self.registry
    }

    pub fn broadcast_mode(&self) -> BroadcastMode {
        self.broadcast_mode
    }

    pub fn await_tx(&self) -> bool {
        self.await_tx
    }

    pub fn from_address(&self) -> Option<&AccountId> {
        self.from_address.as_ref()
    }

    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn cancellation(&self) -> Option<&ShutdownToken> {
        self.cancellation.as_ref()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("chain_id", &self.chain_id)
            .field("has_rpc", &self.rpc.is_some())
            .field("keyring", &self.keyring)
            .field("broadcast_mode", &self.broadcast_mode)
            .field("await_tx", &self.await_tx)
            .field("from_address", &self.from_address.as_ref().map(|a| a.to_string()))
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Fee and encoding parameters of built transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct TxConfig {
    pub fee_denom: String,
    /// Price per gas unit in `fee_denom`.
    pub gas_price: f64,
    /// Multiplier applied to simulated gas usage.
    pub gas_adjustment: f64,
    /// Gas limit used when simulation is off.
    pub gas_limit: u64,
    pub memo: String,
    /// Zero means no timeout height.
    pub timeout_height: u32,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            fee_denom: "udevcore".to_string(),
            gas_price: 0.0625,
            gas_adjustment: 1.2,
            gas_limit: 200_000,
            memo: String::new(),
            timeout_height: 0,
        }
    }
}

impl TxConfig {
    /// Gas limit for a simulated usage, rounded up.
    pub fn adjusted_gas(&self, gas_used: u64) -> u64 {
        (gas_used as f64 * self.gas_adjustment).ceil() as u64
    }

    /// Fee amount for a gas limit, rounded up.
    pub fn fee_amount(&self, gas_limit: u64) -> u128 {
        (gas_limit as f64 * self.gas_price).ceil() as u128
    }
}

/// Assembles unsigned transactions.
#[derive(Debug, Clone, Default)]
pub struct TxFactory {
    keybase: Option<Arc<Keyring>>,
    chain_id: Option<ChainId>,
    tx_config: TxConfig,
    simulate_and_execute: bool,
}

impl TxFactory {
    #[must_use]
    pub fn with_keybase(self, keybase: Arc<Keyring>) -> Self {
        Self {
            keybase: Some(keybase),
            ..self
        }
    }

    #[must_use]
    pub fn with_chain_id(self, chain_id: ChainId) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..self
        }
    }

    #[must_use]
    pub fn with_tx_config(self, tx_config: TxConfig) -> Self {
        Self { tx_config, ..self }
    }

    #[must_use]
    pub fn with_simulate_and_execute(self, simulate_and_execute: bool) -> Self {
        Self {
            simulate_and_execute,
            ..self
        }
    }

    pub fn keybase(&self) -> Option<&Arc<Keyring>> {
        self.keybase.as_ref()
    }

    pub fn chain_id(&self) -> Option<&ChainId> {
        self.chain_id.as_ref()
    }

    pub fn tx_config(&self) -> &TxConfig {
        &self.tx_config
    }

    pub fn simulate_and_execute(&self) -> bool {
        self.simulate_and_execute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_returns_new_value() {
        let base = ClientContext::default();
        let derived = base.clone().with_await_tx(true).with_broadcast_mode(BroadcastMode::Async);

        assert!(!base.await_tx());
        assert_eq!(base.broadcast_mode(), BroadcastMode::Sync);
        assert!(derived.await_tx());
        assert_eq!(derived.broadcast_mode(), BroadcastMode::Async);
    }

    #[test]
    fn test_context_chain_id() {
        let chain_id: ChainId = "coreum-devnet-1".parse().unwrap();
        let ctx = ClientContext::default().with_chain_id(chain_id.clone());
        assert_eq!(ctx.chain_id(), Some(&chain_id));
        assert!(ctx.from_address().is_none());
        assert!(ctx.rpc().is_none());
    }

    #[test]
    fn test_factory_copy_on_write() {
        let factory = TxFactory::default().with_simulate_and_execute(true);
        let with_memo = factory.clone().with_tx_config(TxConfig {
            memo: "hello".to_string(),
            ..TxConfig::default()
        });

        assert_eq!(factory.tx_config().memo, "");
        assert_eq!(with_memo.tx_config().memo, "hello");
        assert!(with_memo.simulate_and_execute());
        assert_eq!(with_memo.tx_config().gas_limit, factory.tx_config().gas_limit);
    }

    #[test]
    fn test_gas_and_fee_rounding() {
        let config = TxConfig {
            gas_price: 0.0625,
            gas_adjustment: 1.2,
            ..TxConfig::default()
        };
        assert_eq!(config.adjusted_gas(100_000), 120_000);
        assert_eq!(config.adjusted_gas(1), 2);
        assert_eq!(config.fee_amount(120_000), 7_500);
        assert_eq!(config.fee_amount(1), 1);
    }

    #[tokio::test]
    async fn test_clones_share_sequencer() {
        let ctx = ClientContext::default();
        let other = ctx.clone().with_await_tx(true);

        *ctx.sequencer().lock().await = Some(7);
        assert_eq!(*other.sequencer().lock().await, Some(7));
    }
}
