//! Typed HTTP client for the NFT gateway API.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassRequest {
    #[serde(rename = "classSymbol")]
    pub class_symbol: String,
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "classDescription")]
    pub class_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    #[serde(rename = "classSymbol")]
    pub class_symbol: String,
    #[serde(rename = "nftID")]
    pub nft_id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(rename = "classID")]
    pub class_id: String,
    #[serde(rename = "nftID")]
    pub nft_id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationResponse {
    pub message: String,
    pub txhash: String,
    pub class_id: String,
    #[serde(default)]
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub chain_id: String,
    pub address: String,
}

/// Error body returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(default)]
    pub txhash: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {} ({})", .body.error, .body.kind)]
    Api { status: StatusCode, body: ApiErrorBody },

    #[error("gateway returned {status}: {text}")]
    Unexpected { status: StatusCode, text: String },
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        let resp = self
            .client
            .get(format!("{}/api/status", self.base_url))
            .send()
            .await?;
        parse(resp).await
    }

    /// Issue a class owned by the gateway's account.
    pub async fn create_class(&self, req: &CreateClassRequest) -> Result<OperationResponse, ClientError> {
        self.post("/api/create-class", req).await
    }

    pub async fn mint(&self, req: &MintRequest) -> Result<OperationResponse, ClientError> {
        self.post("/api/mint", req).await
    }

    pub async fn update(&self, req: &UpdateRequest) -> Result<OperationResponse, ClientError> {
        self.post("/api/update", req).await
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<OperationResponse, ClientError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        parse(resp).await
    }
}

async fn parse<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    let text = resp.text().await?;

    if status.is_success() {
        return match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(_) => Err(ClientError::Unexpected { status, text }),
        };
    }

    match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => Err(ClientError::Api { status, body }),
        Err(_) => Err(ClientError::Unexpected { status, text }),
    }
}
