//! Transaction signing, submission, and confirmation monitoring.
//!
//! # Responsibilities
//! - Fetch account number and sequence
//! - Estimate gas by simulation when the factory asks for it
//! - Sign and submit the single-message transaction
//! - Wait, bounded by a deadline and a cancellation token, for inclusion
//!
//! Nothing is retried. Once the node has accepted a transaction, every failure
//! to observe its fate is reported as [`BroadcastError::Unknown`].
//!
//! When the context carries a pipeline deadline, every step counts against
//! it, the wait for the sequencer included. Running out before submission is
//! [`BroadcastError::DeadlineExceeded`]; running out afterwards is `Unknown`.

use std::future::Future;
use std::time::{Duration, Instant};

use cosmrs::crypto::PublicKey;
use cosmrs::tx::{Body, Fee, SignDoc, SignerInfo};
use cosmrs::{AccountId, Coin, Denom};
use sha2::{Digest, Sha256};
use tokio::time::{interval, timeout, timeout_at, MissedTickBehavior};

use crate::ledger::codec::LedgerMsg;
use crate::ledger::context::{ClientContext, TxConfig, TxFactory};
use crate::ledger::identity::Keyring;
use crate::ledger::rpc::LedgerRpc;
use crate::ledger::types::{BroadcastError, TxOutcome, TxResponse};
use crate::observability::metrics;

/// Sign, submit and (if the context says so) await one message.
pub async fn broadcast_tx(
    ctx: &ClientContext,
    factory: &TxFactory,
    msg: LedgerMsg,
) -> Result<TxOutcome, BroadcastError> {
    let operation = msg.operation();
    let start = Instant::now();

    let result = execute(ctx, factory, &msg).await;

    match &result {
        Ok(outcome) => {
            tracing::info!(
                operation,
                txhash = %outcome.txhash,
                height = ?outcome.height,
                gas_used = outcome.gas_used,
                "Transaction completed"
            );
            metrics::record_broadcast(operation, "success", start);
        }
        Err(e) => {
            tracing::warn!(operation, kind = e.kind(), error = %e, "Transaction failed");
            metrics::record_broadcast(operation, e.kind(), start);
        }
    }

    result
}

async fn execute(
    ctx: &ClientContext,
    factory: &TxFactory,
    msg: &LedgerMsg,
) -> Result<TxOutcome, BroadcastError> {
    let deadline = Deadline::after(ctx.deadline());

    let rpc = ctx
        .rpc()
        .ok_or_else(|| BroadcastError::Submission("client context has no RPC handle".to_string()))?;
    let keyring = factory
        .keybase()
        .or_else(|| ctx.keyring())
        .ok_or_else(|| BroadcastError::Signing("no keyring configured".to_string()))?;
    let chain_id = factory
        .chain_id()
        .or_else(|| ctx.chain_id())
        .ok_or_else(|| BroadcastError::Signing("no chain id configured".to_string()))?;
    let from = ctx
        .from_address()
        .ok_or_else(|| BroadcastError::Signing("client context has no from-address".to_string()))?;

    if msg.signer() != from.to_string() {
        return Err(BroadcastError::Signing(format!(
            "message signer {} is not the from-address {}",
            msg.signer(),
            from
        )));
    }

    let public_key = keyring
        .identity_by_address(from)
        .map(|identity| identity.public_key().clone())
        .ok_or_else(|| BroadcastError::Signing(format!("no key for address {}", from)))?;

    let any = ctx
        .registry()
        .pack(msg)
        .map_err(|e| BroadcastError::Encoding(e.to_string()))?;
    let tx_config = factory.tx_config();
    let body = Body::new(vec![any], tx_config.memo.clone(), tx_config.timeout_height);

    // 1. Account state, serialized with other submissions from this account
    let mut next_sequence = deadline.limit("sequencer wait", ctx.sequencer().lock()).await?;
    let account = deadline
        .limit("account query", rpc.account(&from.to_string()))
        .await?
        .map_err(|e| BroadcastError::AccountQuery(e.to_string()))?;
    let sequence = next_sequence.map_or(account.sequence, |next| next.max(account.sequence));

    let signer = TxSigner {
        keyring,
        address: from,
        public_key,
        chain_id: chain_id
            .as_str()
            .parse()
            .map_err(|e| BroadcastError::Signing(format!("invalid chain id: {}", e)))?,
        account_number: account.account_number,
        sequence,
    };

    // 2. Gas
    let gas_limit = if factory.simulate_and_execute() {
        let draft = signer.sign(&body, fee(tx_config, tx_config.gas_limit)?)?;
        let estimate = deadline
            .limit("simulation", rpc.simulate(draft))
            .await?
            .map_err(|e| BroadcastError::Simulation(e.to_string()))?;
        let adjusted = tx_config.adjusted_gas(estimate.gas_used);
        tracing::debug!(
            gas_used = estimate.gas_used,
            gas_limit = adjusted,
            "Simulation succeeded"
        );
        adjusted
    } else {
        tx_config.gas_limit
    };

    // 3. Sign
    let tx_bytes = signer.sign(&body, fee(tx_config, gas_limit)?)?;
    let local_hash = tx_hash(&tx_bytes);

    // 4. Submit. The sequence counts as used until the node says otherwise, so a
    // submission abandoned mid-flight never hands its sequence to the next run.
    *next_sequence = Some(sequence + 1);
    let response = match deadline
        .limit("submission", rpc.broadcast_tx(tx_bytes, ctx.broadcast_mode()))
        .await
    {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            *next_sequence = None;
            return Err(BroadcastError::Submission(e.to_string()));
        }
        Err(_) => {
            return Err(BroadcastError::Unknown {
                txhash: local_hash,
                reason: "deadline elapsed while submitting".to_string(),
            });
        }
    };

    if !response.is_ok() {
        *next_sequence = None;
        return Err(BroadcastError::Rejected {
            code: response.code,
            codespace: response.codespace,
            log: response.raw_log,
        });
    }
    drop(next_sequence);

    tracing::debug!(
        txhash = %response.txhash,
        sequence,
        gas_limit,
        "Transaction accepted by node"
    );

    if !ctx.await_tx() {
        return Ok(TxOutcome {
            txhash: response.txhash,
            height: None,
            gas_wanted: gas_limit,
            gas_used: 0,
        });
    }

    // 5. Await inclusion
    let window = deadline
        .remaining()
        .map_or(ctx.confirmation_timeout(), |left| left.min(ctx.confirmation_timeout()));
    await_inclusion(ctx, rpc.as_ref(), &response.txhash, window).await
}

/// Poll for the transaction until included, timed out, or cancelled.
async fn await_inclusion(
    ctx: &ClientContext,
    rpc: &dyn LedgerRpc,
    txhash: &str,
    window: Duration,
) -> Result<TxOutcome, BroadcastError> {
    let mut last_error: Option<String> = None;

    let poll = async {
        let mut ticker = interval(ctx.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match rpc.get_tx(txhash).await {
                Ok(Some(tx)) => return included(tx),
                Ok(None) => tracing::debug!(txhash, "Transaction pending"),
                Err(e) => {
                    tracing::warn!(txhash, error = %e, "Confirmation query failed");
                    last_error = Some(e.to_string());
                }
            }
        }
    };

    let cancelled = async {
        match ctx.cancellation() {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    let result = tokio::select! {
        result = timeout(window, poll) => result,
        _ = cancelled => {
            return Err(BroadcastError::Unknown {
                txhash: txhash.to_string(),
                reason: "cancelled while awaiting inclusion".to_string(),
            });
        }
    };

    match result {
        Ok(outcome) => outcome,
        Err(_) => {
            let reason = match last_error {
                Some(e) => format!("not observed in a block within {:?} (last error: {})", window, e),
                None => format!("not included within {:?}", window),
            };
            Err(BroadcastError::Unknown {
                txhash: txhash.to_string(),
                reason,
            })
        }
    }
}

/// Point in time a pipeline run must finish by, if any.
#[derive(Debug, Clone, Copy)]
struct Deadline(Option<tokio::time::Instant>);

impl Deadline {
    fn after(budget: Option<Duration>) -> Self {
        Self(budget.map(|budget| tokio::time::Instant::now() + budget))
    }

    fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(tokio::time::Instant::now()))
    }

    /// Run `step`, failing with `DeadlineExceeded { stage }` if time runs out.
    async fn limit<F: Future>(&self, stage: &'static str, step: F) -> Result<F::Output, BroadcastError> {
        match self.0 {
            Some(at) => timeout_at(at, step)
                .await
                .map_err(|_| BroadcastError::DeadlineExceeded { stage }),
            None => Ok(step.await),
        }
    }
}

/// Ledger transaction hash: upper-case hex SHA-256 of the signed bytes.
fn tx_hash(tx_bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx_bytes))
}

fn included(tx: TxResponse) -> Result<TxOutcome, BroadcastError> {
    if !tx.is_ok() {
        return Err(BroadcastError::Execution {
            txhash: tx.txhash,
            code: tx.code,
            codespace: tx.codespace,
            log: tx.raw_log,
        });
    }

    Ok(TxOutcome {
        txhash: tx.txhash,
        height: Some(tx.height),
        gas_wanted: u64::try_from(tx.gas_wanted).unwrap_or_default(),
        gas_used: u64::try_from(tx.gas_used).unwrap_or_default(),
    })
}

fn fee(tx_config: &TxConfig, gas_limit: u64) -> Result<Fee, BroadcastError> {
    let denom: Denom = tx_config
        .fee_denom
        .parse()
        .map_err(|e| BroadcastError::Encoding(format!("invalid fee denom '{}': {}", tx_config.fee_denom, e)))?;
    let amount = Coin {
        denom,
        amount: tx_config.fee_amount(gas_limit),
    };
    Ok(Fee::from_amount_and_gas(amount, gas_limit))
}

/// Signing parameters fixed for one submission.
struct TxSigner<'a> {
    keyring: &'a Keyring,
    address: &'a AccountId,
    public_key: PublicKey,
    chain_id: cosmrs::tendermint::chain::Id,
    account_number: u64,
    sequence: u64,
}

impl TxSigner<'_> {
    fn sign(&self, body: &Body, fee: Fee) -> Result<Vec<u8>, BroadcastError> {
        let auth_info =
            SignerInfo::single_direct(Some(self.public_key.clone()), self.sequence).auth_info(fee);
        let sign_doc = SignDoc::new(body, &auth_info, &self.chain_id, self.account_number)
            .map_err(|e| BroadcastError::Signing(e.to_string()))?;
        let raw = self.keyring.sign(self.address, sign_doc)?;
        raw.to_bytes()
            .map_err(|e| BroadcastError::Signing(e.to_string()))
    }
}
