//! Message builders for the asset NFT module.
//!
//! Pure functions: the same context and input always give the same message,
//! and nothing here talks to the node.

use cosmrs::AccountId;
use serde::{Deserialize, Serialize};

use crate::ledger::codec::{
    ClassFeature, CodecError, DataDynamic, DataDynamicIndexedItem, DataDynamicItem, DataEditor,
    LedgerMsg, MsgIssueClass, MsgMint, MsgUpdateData, NftData,
};
use crate::ledger::context::ClientContext;
use crate::ledger::types::MessageError;

/// Separator between the lowercased symbol and the issuer in a class id.
pub const CLASS_ID_SEPARATOR: &str = "-";

/// Item index rewritten by data updates.
pub const UPDATED_ITEM_INDEX: u32 = 0;

/// Features every issued class carries.
pub const ISSUED_CLASS_FEATURES: &[ClassFeature] = &[ClassFeature::Freezing];

/// Editors of the data item written at mint time.
pub const ITEM_EDITORS: &[DataEditor] = &[DataEditor::Owner];

/// Fields of a class issuance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IssueClassRequest {
    pub symbol: String,
    pub name: String,
    pub description: String,
}

/// Fields of a mint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MintRequest {
    pub class_symbol: String,
    pub nft_id: String,
    pub name: String,
    pub description: String,
}

/// Fields of a data update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpdateDataRequest {
    pub class_id: String,
    pub nft_id: String,
    pub name: String,
    pub description: String,
}

/// JSON document stored in an NFT data item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
}

impl NftMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(self).map_err(|e| MessageError::Payload(e.to_string()))
    }
}

/// Class id of `symbol` issued by `issuer`.
pub fn build_class_id(symbol: &str, issuer: &AccountId) -> String {
    format!("{}{}{}", symbol.to_lowercase(), CLASS_ID_SEPARATOR, issuer)
}

fn sender(ctx: &ClientContext) -> Result<&AccountId, MessageError> {
    ctx.from_address().ok_or(MessageError::MissingSender)
}

fn data_item(metadata: &NftMetadata) -> Result<DataDynamicItem, MessageError> {
    DataDynamicItem::new(ITEM_EDITORS, metadata.to_bytes()?).map_err(|e| match e {
        CodecError::EmptyEditors => MessageError::EmptyEditors,
        other => MessageError::Payload(other.to_string()),
    })
}

/// Class issuance by the context's account.
pub fn issue_class(ctx: &ClientContext, request: &IssueClassRequest) -> Result<LedgerMsg, MessageError> {
    let issuer = sender(ctx)?;

    Ok(LedgerMsg::IssueClass(MsgIssueClass {
        issuer: issuer.to_string(),
        symbol: request.symbol.clone(),
        name: request.name.clone(),
        description: request.description.clone(),
        features: ISSUED_CLASS_FEATURES.iter().map(|f| *f as i32).collect(),
        royalty_rate: "0".to_string(),
        ..Default::default()
    }))
}

/// Mint into the class `request.class_symbol` issued by the context's account.
pub fn mint(ctx: &ClientContext, request: &MintRequest) -> Result<LedgerMsg, MessageError> {
    let sender = sender(ctx)?;
    let metadata = NftMetadata::new(&request.name, &request.description);
    let data = NftData::Dynamic(DataDynamic {
        items: vec![data_item(&metadata)?],
    });

    Ok(LedgerMsg::Mint(MsgMint {
        sender: sender.to_string(),
        class_id: build_class_id(&request.class_symbol, sender),
        id: request.nft_id.clone(),
        data: Some(data.to_any()),
        ..Default::default()
    }))
}

/// Overwrite item 0 of an instance's dynamic data.
pub fn update_data(ctx: &ClientContext, request: &UpdateDataRequest) -> Result<LedgerMsg, MessageError> {
    let sender = sender(ctx)?;
    let item = data_item(&NftMetadata::new(&request.name, &request.description))?;

    Ok(LedgerMsg::UpdateData(MsgUpdateData {
        sender: sender.to_string(),
        class_id: request.class_id.clone(),
        id: request.nft_id.clone(),
        items: vec![DataDynamicIndexedItem {
            index: UPDATED_ITEM_INDEX,
            data: item.data,
        }],
    }))
}
