//! Error responses of the HTTP API.
//!
//! Every failure is answered with `{"error", "kind", "txhash"?}`. The status
//! tells the client whether retrying can make sense: 4xx never reached the
//! ledger or was refused by it, 502 never reached consensus, 504 may or may
//! not have been included.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ledger::types::{BroadcastError, LedgerError};

/// Error returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    txhash: Option<&'a str>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::Message(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ledger(LedgerError::Broadcast(e)) => match e {
                BroadcastError::Simulation(_)
                | BroadcastError::Rejected { .. }
                | BroadcastError::Execution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                BroadcastError::AccountQuery(_) | BroadcastError::Submission(_) => {
                    StatusCode::BAD_GATEWAY
                }
                BroadcastError::DeadlineExceeded { .. } | BroadcastError::Unknown { .. } => {
                    StatusCode::GATEWAY_TIMEOUT
                }
                BroadcastError::Encoding(_) | BroadcastError::Signing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "input",
            ApiError::Ledger(LedgerError::Message(_)) => "message",
            ApiError::Ledger(LedgerError::Broadcast(e)) => e.kind(),
        }
    }

    pub fn txhash(&self) -> Option<&str> {
        match self {
            ApiError::Ledger(LedgerError::Broadcast(e)) => e.txhash(),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), txhash = ?self.txhash(), error = %self, "Request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            txhash: self.txhash(),
        };
        (status, Json(body)).into_response()
    }
}
