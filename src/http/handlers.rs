//! API handlers.
//!
//! Request bodies use the frontend's camelCase field names. Identifiers are
//! required and must be non-empty; the free-text metadata fields (`name`,
//! `description`, `classDescription`) default to empty strings.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::ledger::messages::{IssueClassRequest, MintRequest, UpdateDataRequest};
use crate::ledger::session::NftReceipt;

pub const CLASS_CREATED: &str = "NFT class created successfully";
pub const NFT_MINTED: &str = "NFT minted successfully";
pub const NFT_UPDATED: &str = "NFT data updated successfully";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub chain_id: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub message: &'static str,
    pub txhash: String,
    pub class_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

impl OperationResponse {
    fn new(message: &'static str, receipt: NftReceipt) -> Self {
        Self {
            message,
            txhash: receipt.outcome.txhash,
            class_id: receipt.class_id,
            height: receipt.outcome.height,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateClassBody {
    #[serde(rename = "classSymbol")]
    pub class_symbol: String,
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "classDescription", default)]
    pub class_description: String,
}

#[derive(Debug, Deserialize)]
pub struct MintBody {
    #[serde(rename = "classSymbol")]
    pub class_symbol: String,
    #[serde(rename = "nftID")]
    pub nft_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    #[serde(rename = "classID")]
    pub class_id: String,
    #[serde(rename = "nftID")]
    pub nft_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the NFT gateway!",
    })
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        chain_id: state
            .ledger
            .chain_id()
            .map(ToString::to_string)
            .unwrap_or_default(),
        address: state.ledger.address().to_string(),
    })
}

pub async fn create_class(
    State(state): State<AppState>,
    payload: Result<Json<CreateClassBody>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let body = decode(payload)?;
    require("classSymbol", &body.class_symbol)?;
    require("className", &body.class_name)?;

    let request = IssueClassRequest {
        symbol: body.class_symbol,
        name: body.class_name,
        description: body.class_description,
    };
    let receipt = state.ledger.issue_class(&request).await?;

    tracing::info!(class_id = %receipt.class_id, txhash = %receipt.outcome.txhash, "NFT class created");
    Ok(Json(OperationResponse::new(CLASS_CREATED, receipt)))
}

pub async fn mint(
    State(state): State<AppState>,
    payload: Result<Json<MintBody>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let body = decode(payload)?;
    require("classSymbol", &body.class_symbol)?;
    require("nftID", &body.nft_id)?;

    let request = MintRequest {
        class_symbol: body.class_symbol,
        nft_id: body.nft_id,
        name: body.name,
        description: body.description,
    };
    let receipt = state.ledger.mint(&request).await?;

    tracing::info!(class_id = %receipt.class_id, nft_id = %request.nft_id, txhash = %receipt.outcome.txhash, "NFT minted");
    Ok(Json(OperationResponse::new(NFT_MINTED, receipt)))
}

pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let body = decode(payload)?;
    require("classID", &body.class_id)?;
    require("nftID", &body.nft_id)?;

    let request = UpdateDataRequest {
        class_id: body.class_id,
        nft_id: body.nft_id,
        name: body.name,
        description: body.description,
    };
    let receipt = state.ledger.update_data(&request).await?;

    tracing::info!(class_id = %receipt.class_id, nft_id = %request.nft_id, txhash = %receipt.outcome.txhash, "NFT data updated");
    Ok(Json(OperationResponse::new(NFT_UPDATED, receipt)))
}
