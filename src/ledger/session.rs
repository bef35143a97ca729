//! Process-wide ledger handle.
//!
//! Built once at startup from configuration and shared behind an `Arc`. It
//! owns the client context and transaction factory and runs the three NFT
//! operations end to end (build the message, then broadcast it).
//!
//! Setup takes the seed phrase and passphrase out of the identity config and
//! wipes them once the key is derived; neither outlives this call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cosmrs::AccountId;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::config::schema::GatewayConfig;
use crate::ledger::broadcast::broadcast_tx;
use crate::ledger::codec::EncodingRegistry;
use crate::ledger::connection;
use crate::ledger::context::{ClientContext, TxConfig, TxFactory};
use crate::ledger::identity::{full_bip44_path, AccountIdentity, Keyring};
use crate::ledger::messages::{
    self, build_class_id, IssueClassRequest, MintRequest, UpdateDataRequest,
};
use crate::ledger::rpc::{GrpcLedger, LedgerRpc};
use crate::ledger::types::{
    ChainId, IdentityConfig, LedgerConfig, LedgerResult, SetupError, TxOutcome,
};
use crate::lifecycle::ShutdownToken;

/// Result of a completed NFT operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NftReceipt {
    pub class_id: String,
    #[serde(flatten)]
    pub outcome: TxOutcome,
}

/// Ready-to-use context and factory for the configured identity.
#[derive(Clone)]
pub struct LedgerHandle {
    ctx: ClientContext,
    factory: TxFactory,
    identity: AccountIdentity,
}

impl LedgerHandle {
    /// Connect to the configured node and derive the signing identity.
    ///
    /// Consumes `config.identity`'s secrets.
    pub async fn connect(config: &mut GatewayConfig) -> Result<Self, SetupError> {
        let channel = connection::connect(&config.ledger).await?;
        let rpc = GrpcLedger::new(
            channel,
            Duration::from_secs(config.ledger.rpc_timeout_secs),
        );
        Self::from_rpc(Arc::new(rpc), &config.ledger, &mut config.identity)
    }

    /// Assemble a handle around an existing RPC implementation.
    ///
    /// The seed phrase and passphrase are taken out of `identity`, whether
    /// setup succeeds or not.
    pub fn from_rpc(
        rpc: Arc<dyn LedgerRpc>,
        ledger: &LedgerConfig,
        identity: &mut IdentityConfig,
    ) -> Result<Self, SetupError> {
        let mnemonic = identity.mnemonic.take().map(Zeroizing::new);
        let passphrase = Zeroizing::new(std::mem::take(&mut identity.passphrase));

        let chain_id: ChainId = ledger.chain_id.parse()?;

        let mnemonic = mnemonic
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| SetupError::Config("identity mnemonic is not set".to_string()))?;
        let hd_path = identity
            .hd_path
            .clone()
            .unwrap_or_else(|| full_bip44_path(ledger.coin_type));

        let mut keyring = Keyring::in_memory(&ledger.address_prefix);
        let account = keyring.new_account(
            &identity.key_name,
            &mnemonic,
            &passphrase,
            &hd_path,
            identity.algorithm,
        )?;
        let keyring = Arc::new(keyring);

        let registry = EncodingRegistry::new().register_auth().register_asset_nft();

        let ctx = ClientContext::new(registry)
            .with_chain_id(chain_id.clone())
            .with_rpc(rpc)
            .with_keyring(keyring.clone())
            .with_broadcast_mode(ledger.broadcast_mode)
            .with_await_tx(ledger.await_tx)
            .with_from_address(account.address().clone())
            .with_confirmation_timeout(Duration::from_secs(ledger.confirmation_timeout_secs))
            .with_poll_interval(Duration::from_millis(ledger.poll_interval_ms));

        let factory = TxFactory::default()
            .with_keybase(keyring)
            .with_chain_id(chain_id)
            .with_tx_config(TxConfig {
                fee_denom: ledger.fee_denom.clone(),
                gas_price: ledger.gas_price,
                gas_adjustment: ledger.gas_adjustment,
                gas_limit: ledger.gas_limit,
                memo: ledger.memo.clone(),
                timeout_height: 0,
            })
            .with_simulate_and_execute(ledger.simulate_and_execute);

        tracing::info!(
            chain_id = %ledger.chain_id,
            address = %account.address(),
            simulate = ledger.simulate_and_execute,
            await_tx = ledger.await_tx,
            "Ledger handle ready"
        );

        Ok(Self {
            ctx,
            factory,
            identity: account,
        })
    }

    /// Bound every pipeline run, sequencer wait included, by `deadline`.
    #[must_use]
    pub fn with_deadline(self, deadline: Duration) -> Self {
        Self {
            ctx: self.ctx.with_deadline(deadline),
            ..self
        }
    }

    /// Abort confirmation waits when `token` fires.
    #[must_use]
    pub fn with_cancellation(self, token: ShutdownToken) -> Self {
        Self {
            ctx: self.ctx.with_cancellation(token),
            ..self
        }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn factory(&self) -> &TxFactory {
        &self.factory
    }

    pub fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    pub fn address(&self) -> &AccountId {
        self.identity.address()
    }

    pub fn chain_id(&self) -> Option<&ChainId> {
        self.ctx.chain_id()
    }

    /// Issue a class owned by this handle's account.
    #[tracing::instrument(skip_all, fields(symbol = %request.symbol))]
    pub async fn issue_class(&self, request: &IssueClassRequest) -> LedgerResult<NftReceipt> {
        let msg = messages::issue_class(&self.ctx, request)?;
        let outcome = broadcast_tx(&self.ctx, &self.factory, msg).await?;

        Ok(NftReceipt {
            class_id: build_class_id(&request.symbol, self.address()),
            outcome,
        })
    }

    /// Mint into a class this handle's account issued.
    #[tracing::instrument(skip_all, fields(symbol = %request.class_symbol, nft_id = %request.nft_id))]
    pub async fn mint(&self, request: &MintRequest) -> LedgerResult<NftReceipt> {
        let msg = messages::mint(&self.ctx, request)?;
        let outcome = broadcast_tx(&self.ctx, &self.factory, msg).await?;

        Ok(NftReceipt {
            class_id: build_class_id(&request.class_symbol, self.address()),
            outcome,
        })
    }

    /// Overwrite the data of an existing instance.
    #[tracing::instrument(skip_all, fields(class_id = %request.class_id, nft_id = %request.nft_id))]
    pub async fn update_data(&self, request: &UpdateDataRequest) -> LedgerResult<NftReceipt> {
        let msg = messages::update_data(&self.ctx, request)?;
        let outcome = broadcast_tx(&self.ctx, &self.factory, msg).await?;

        Ok(NftReceipt {
            class_id: request.class_id.clone(),
            outcome,
        })
    }
}

impl fmt::Debug for LedgerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerHandle")
            .field("ctx", &self.ctx)
            .field("identity", &self.identity)
            .finish()
    }
}
