//! Remote ledger RPC contract and its gRPC implementation.
//!
//! # Responsibilities
//! - Query account number and sequence
//! - Simulate, broadcast and look up transactions
//! - Bound every call with a timeout
//!
//! The pipeline only depends on [`LedgerRpc`], so tests can swap the node
//! for an in-process mock.

use std::time::Duration;

use async_trait::async_trait;
use cosmrs::proto::cosmos::auth::v1beta1::{
    query_client::QueryClient as AuthQueryClient, BaseAccount, QueryAccountRequest,
};
use cosmrs::proto::cosmos::base::abci::v1beta1::TxResponse as ProtoTxResponse;
use cosmrs::proto::cosmos::tx::v1beta1::{
    service_client::ServiceClient as TxServiceClient, BroadcastMode as ProtoBroadcastMode,
    BroadcastTxRequest, GetTxRequest, SimulateRequest,
};
use prost::Message;
use tokio::time::timeout;
use tonic::transport::Channel;

use crate::ledger::codec::BASE_ACCOUNT_TYPE_URL;
use crate::ledger::types::{AccountInfo, BroadcastMode, GasEstimate, RpcError, TxResponse};

/// Calls the broadcast pipeline makes against a node.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Account number and current committed sequence of `address`.
    async fn account(&self, address: &str) -> Result<AccountInfo, RpcError>;

    /// Dry-run signed transaction bytes.
    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<GasEstimate, RpcError>;

    /// Submit signed transaction bytes.
    async fn broadcast_tx(
        &self,
        tx_bytes: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<TxResponse, RpcError>;

    /// Look up an included transaction; `None` while it is not in a block.
    async fn get_tx(&self, txhash: &str) -> Result<Option<TxResponse>, RpcError>;
}

/// [`LedgerRpc`] over a tonic channel.
#[derive(Clone)]
pub struct GrpcLedger {
    channel: Channel,
    timeout_duration: Duration,
}

impl GrpcLedger {
    pub fn new(channel: Channel, timeout_duration: Duration) -> Self {
        Self {
            channel,
            timeout_duration,
        }
    }

    async fn call<T, F>(&self, method: &'static str, fut: F) -> Result<T, RpcError>
    where
        F: std::future::Future<Output = Result<tonic::Response<T>, tonic::Status>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status)) => {
                tracing::debug!(method, code = ?status.code(), message = status.message(), "RPC error status");
                Err(status_to_error(status))
            }
            Err(_) => {
                tracing::warn!(method, timeout_secs = self.timeout_duration.as_secs(), "RPC timeout");
                Err(RpcError::Transport(format!(
                    "{} timed out after {:?}",
                    method, self.timeout_duration
                )))
            }
        }
    }
}

#[async_trait]
impl LedgerRpc for GrpcLedger {
    async fn account(&self, address: &str) -> Result<AccountInfo, RpcError> {
        let mut client = AuthQueryClient::new(self.channel.clone());
        let request = QueryAccountRequest {
            address: address.to_string(),
        };
        let response = self.call("auth/Account", client.account(request)).await?;

        let any = response
            .account
            .ok_or_else(|| RpcError::Decode("account missing from response".to_string()))?;
        if any.type_url != BASE_ACCOUNT_TYPE_URL {
            return Err(RpcError::Decode(format!(
                "unsupported account type {}",
                any.type_url
            )));
        }
        let account = BaseAccount::decode(any.value.as_slice())
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        Ok(AccountInfo {
            account_number: account.account_number,
            sequence: account.sequence,
        })
    }

    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<GasEstimate, RpcError> {
        let mut client = TxServiceClient::new(self.channel.clone());
        let request = SimulateRequest {
            tx_bytes,
            ..Default::default()
        };
        let response = self.call("tx/Simulate", client.simulate(request)).await?;

        let gas_info = response
            .gas_info
            .ok_or_else(|| RpcError::Decode("gas info missing from simulation".to_string()))?;

        Ok(GasEstimate {
            gas_wanted: gas_info.gas_wanted,
            gas_used: gas_info.gas_used,
        })
    }

    async fn broadcast_tx(
        &self,
        tx_bytes: Vec<u8>,
        mode: BroadcastMode,
    ) -> Result<TxResponse, RpcError> {
        let mut client = TxServiceClient::new(self.channel.clone());
        let mode = match mode {
            BroadcastMode::Sync => ProtoBroadcastMode::Sync,
            BroadcastMode::Async => ProtoBroadcastMode::Async,
        };
        let request = BroadcastTxRequest {
            tx_bytes,
            mode: mode as i32,
        };
        let response = self.call("tx/BroadcastTx", client.broadcast_tx(request)).await?;

        response
            .tx_response
            .map(convert_tx_response)
            .ok_or_else(|| RpcError::Decode("tx response missing from broadcast".to_string()))
    }

    async fn get_tx(&self, txhash: &str) -> Result<Option<TxResponse>, RpcError> {
        let mut client = TxServiceClient::new(self.channel.clone());
        let request = GetTxRequest {
            hash: txhash.to_string(),
        };

        match self.call("tx/GetTx", client.get_tx(request)).await {
            Ok(response) => Ok(response.tx_response.map(convert_tx_response)),
            Err(RpcError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for GrpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcLedger")
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}

fn status_to_error(status: tonic::Status) -> RpcError {
    match status.code() {
        tonic::Code::Unavailable | tonic::Code::DeadlineExceeded | tonic::Code::Cancelled => {
            RpcError::Transport(status.message().to_string())
        }
        tonic::Code::NotFound => RpcError::NotFound(status.message().to_string()),
        code => RpcError::Status {
            code: format!("{:?}", code),
            message: status.message().to_string(),
        },
    }
}

fn convert_tx_response(response: ProtoTxResponse) -> TxResponse {
    TxResponse {
        txhash: response.txhash,
        height: response.height,
        code: response.code,
        codespace: response.codespace,
        raw_log: response.raw_log,
        gas_wanted: response.gas_wanted,
        gas_used: response.gas_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = status_to_error(tonic::Status::unavailable("connection refused"));
        assert!(matches!(err, RpcError::Transport(_)));

        let err = status_to_error(tonic::Status::invalid_argument("out of gas"));
        match err {
            RpcError::Status { code, message } => {
                assert_eq!(code, "InvalidArgument");
                assert_eq!(message, "out of gas");
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = status_to_error(tonic::Status::not_found("tx not found"));
        assert!(matches!(err, RpcError::NotFound(_)));
    }

    #[test]
    fn test_convert_tx_response() {
        let proto = ProtoTxResponse {
            height: 42,
            txhash: "ABCD".into(),
            codespace: "nft".into(),
            code: 2,
            raw_log: "class not found".into(),
            gas_wanted: 100,
            gas_used: 80,
            ..Default::default()
        };
        let converted = convert_tx_response(proto);
        assert_eq!(converted.height, 42);
        assert_eq!(converted.code, 2);
        assert!(!converted.is_ok());
    }
}
