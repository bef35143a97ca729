//! Protobuf shapes of the `coreum.asset.nft.v1` module and the encoding registry.
//!
//! The registry is the declaration of which type URLs this client can pack
//! into a transaction body or read back from the node. Anything not
//! registered is refused before a transaction is ever signed.

use std::collections::BTreeSet;

use prost::Message;
use thiserror::Error;

pub const MSG_ISSUE_CLASS_TYPE_URL: &str = "/coreum.asset.nft.v1.MsgIssueClass";
pub const MSG_MINT_TYPE_URL: &str = "/coreum.asset.nft.v1.MsgMint";
pub const MSG_UPDATE_DATA_TYPE_URL: &str = "/coreum.asset.nft.v1.MsgUpdateData";
pub const DATA_BYTES_TYPE_URL: &str = "/coreum.asset.nft.v1.DataBytes";
pub const DATA_DYNAMIC_TYPE_URL: &str = "/coreum.asset.nft.v1.DataDynamic";
pub const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";

/// Class-level features toggled at issuance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ClassFeature {
    Burning = 0,
    Freezing = 1,
    Whitelisting = 2,
    DisableSending = 3,
    Soulbound = 4,
}

/// Principals allowed to edit a dynamic data item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DataEditor {
    Admin = 0,
    Owner = 1,
}

#[derive(Clone, PartialEq, Message)]
pub struct MsgIssueClass {
    #[prost(string, tag = "1")]
    pub issuer: String,
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(string, tag = "4")]
    pub description: String,
    #[prost(string, tag = "5")]
    pub uri: String,
    #[prost(string, tag = "6")]
    pub uri_hash: String,
    #[prost(message, optional, tag = "7")]
    pub data: Option<prost_types::Any>,
    #[prost(enumeration = "ClassFeature", repeated, tag = "8")]
    pub features: Vec<i32>,
    /// Decimal encoded as its 18-digit fixed point integer string.
    #[prost(string, tag = "9")]
    pub royalty_rate: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct MsgMint {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub class_id: String,
    #[prost(string, tag = "3")]
    pub id: String,
    #[prost(string, tag = "4")]
    pub uri: String,
    #[prost(string, tag = "5")]
    pub uri_hash: String,
    #[prost(message, optional, tag = "6")]
    pub data: Option<prost_types::Any>,
    #[prost(string, tag = "7")]
    pub recipient: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DataBytes {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DataDynamicItem {
    #[prost(enumeration = "DataEditor", repeated, tag = "1")]
    pub editors: Vec<i32>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

impl DataDynamicItem {
    /// Build an item; an item nobody may edit is refused.
    pub fn new(editors: &[DataEditor], data: Vec<u8>) -> Result<Self, CodecError> {
        if editors.is_empty() {
            return Err(CodecError::EmptyEditors);
        }
        Ok(Self {
            editors: editors.iter().map(|editor| *editor as i32).collect(),
            data,
        })
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct DataDynamic {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<DataDynamicItem>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DataDynamicIndexedItem {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MsgUpdateData {
    #[prost(string, tag = "1")]
    pub sender: String,
    #[prost(string, tag = "2")]
    pub class_id: String,
    #[prost(string, tag = "3")]
    pub id: String,
    #[prost(message, repeated, tag = "4")]
    pub items: Vec<DataDynamicIndexedItem>,
}

/// Data payload attached to an NFT, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NftData {
    Bytes(DataBytes),
    Dynamic(DataDynamic),
}

impl NftData {
    pub fn type_url(&self) -> &'static str {
        match self {
            NftData::Bytes(_) => DATA_BYTES_TYPE_URL,
            NftData::Dynamic(_) => DATA_DYNAMIC_TYPE_URL,
        }
    }

    pub fn to_any(&self) -> prost_types::Any {
        let value = match self {
            NftData::Bytes(data) => data.encode_to_vec(),
            NftData::Dynamic(data) => data.encode_to_vec(),
        };
        prost_types::Any {
            type_url: self.type_url().to_string(),
            value,
        }
    }

    /// Read a payload back from its `Any` form.
    pub fn from_any(any: &prost_types::Any) -> Result<Self, CodecError> {
        match any.type_url.as_str() {
            DATA_BYTES_TYPE_URL => DataBytes::decode(any.value.as_slice())
                .map(NftData::Bytes)
                .map_err(|e| CodecError::Decode(e.to_string())),
            DATA_DYNAMIC_TYPE_URL => DataDynamic::decode(any.value.as_slice())
                .map(NftData::Dynamic)
                .map_err(|e| CodecError::Decode(e.to_string())),
            other => Err(CodecError::Unregistered(other.to_string())),
        }
    }
}

/// The single message a transaction carries.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerMsg {
    IssueClass(MsgIssueClass),
    Mint(MsgMint),
    UpdateData(MsgUpdateData),
}

impl LedgerMsg {
    pub fn type_url(&self) -> &'static str {
        match self {
            LedgerMsg::IssueClass(_) => MSG_ISSUE_CLASS_TYPE_URL,
            LedgerMsg::Mint(_) => MSG_MINT_TYPE_URL,
            LedgerMsg::UpdateData(_) => MSG_UPDATE_DATA_TYPE_URL,
        }
    }

    /// Operation label used in logs and metrics.
    pub fn operation(&self) -> &'static str {
        match self {
            LedgerMsg::IssueClass(_) => "issue_class",
            LedgerMsg::Mint(_) => "mint",
            LedgerMsg::UpdateData(_) => "update_data",
        }
    }

    /// Address that must sign the message.
    pub fn signer(&self) -> &str {
        match self {
            LedgerMsg::IssueClass(msg) => &msg.issuer,
            LedgerMsg::Mint(msg) => &msg.sender,
            LedgerMsg::UpdateData(msg) => &msg.sender,
        }
    }

    fn encode_value(&self) -> Vec<u8> {
        match self {
            LedgerMsg::IssueClass(msg) => msg.encode_to_vec(),
            LedgerMsg::Mint(msg) => msg.encode_to_vec(),
            LedgerMsg::UpdateData(msg) => msg.encode_to_vec(),
        }
    }

    /// Decode a transaction body message back into a typed message.
    pub fn from_any(type_url: &str, value: &[u8]) -> Result<Self, CodecError> {
        let decode_err = |e: prost::DecodeError| CodecError::Decode(e.to_string());
        match type_url {
            MSG_ISSUE_CLASS_TYPE_URL => MsgIssueClass::decode(value)
                .map(LedgerMsg::IssueClass)
                .map_err(decode_err),
            MSG_MINT_TYPE_URL => MsgMint::decode(value).map(LedgerMsg::Mint).map_err(decode_err),
            MSG_UPDATE_DATA_TYPE_URL => MsgUpdateData::decode(value)
                .map(LedgerMsg::UpdateData)
                .map_err(decode_err),
            other => Err(CodecError::Unregistered(other.to_string())),
        }
    }
}

/// Encoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("type {0} is not registered")]
    Unregistered(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("data item must declare at least one editor")]
    EmptyEditors,
}

/// Declaration of the type URLs this client (de)serializes.
#[derive(Debug, Clone, Default)]
pub struct EncodingRegistry {
    type_urls: BTreeSet<&'static str>,
}

impl EncodingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering auth accounts and the asset NFT module.
    pub fn asset_nft() -> Self {
        Self::new().register_auth().register_asset_nft()
    }

    #[must_use]
    pub fn register_auth(self) -> Self {
        self.register(BASE_ACCOUNT_TYPE_URL)
    }

    #[must_use]
    pub fn register_asset_nft(self) -> Self {
        self.register(MSG_ISSUE_CLASS_TYPE_URL)
            .register(MSG_MINT_TYPE_URL)
            .register(MSG_UPDATE_DATA_TYPE_URL)
            .register(DATA_BYTES_TYPE_URL)
            .register(DATA_DYNAMIC_TYPE_URL)
    }

    #[must_use]
    pub fn register(mut self, type_url: &'static str) -> Self {
        self.type_urls.insert(type_url);
        self
    }

    pub fn is_registered(&self, type_url: &str) -> bool {
        self.type_urls.contains(type_url)
    }

    /// Pack a message into the `Any` carried by the transaction body.
    ///
    /// Embedded data payloads must be registered as well.
    pub fn pack(&self, msg: &LedgerMsg) -> Result<cosmrs::Any, CodecError> {
        self.ensure(msg.type_url())?;

        let embedded = match msg {
            LedgerMsg::IssueClass(m) => m.data.as_ref(),
            LedgerMsg::Mint(m) => m.data.as_ref(),
            LedgerMsg::UpdateData(_) => None,
        };
        if let Some(data) = embedded {
            self.ensure(&data.type_url)?;
        }

        Ok(cosmrs::Any {
            type_url: msg.type_url().to_string(),
            value: msg.encode_value(),
        })
    }

    fn ensure(&self, type_url: &str) -> Result<(), CodecError> {
        if self.is_registered(type_url) {
            Ok(())
        } else {
            Err(CodecError::Unregistered(type_url.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mint() -> LedgerMsg {
        let item = DataDynamicItem::new(&[DataEditor::Owner], b"{}".to_vec()).unwrap();
        LedgerMsg::Mint(MsgMint {
            sender: "devcore1sender".into(),
            class_id: "art-devcore1sender".into(),
            id: "1".into(),
            data: Some(NftData::Dynamic(DataDynamic { items: vec![item] }).to_any()),
            ..Default::default()
        })
    }

    #[test]
    fn test_item_requires_editor() {
        assert_eq!(
            DataDynamicItem::new(&[], b"x".to_vec()),
            Err(CodecError::EmptyEditors)
        );
        let item = DataDynamicItem::new(&[DataEditor::Owner], b"x".to_vec()).unwrap();
        assert_eq!(item.editors, vec![DataEditor::Owner as i32]);
    }

    #[test]
    fn test_pack_registered_message() {
        let registry = EncodingRegistry::asset_nft();
        let msg = sample_mint();
        let any = registry.pack(&msg).unwrap();
        assert_eq!(any.type_url, MSG_MINT_TYPE_URL);
        assert_eq!(LedgerMsg::from_any(&any.type_url, &any.value).unwrap(), msg);
    }

    #[test]
    fn test_pack_refuses_unregistered() {
        let registry = EncodingRegistry::new().register_auth();
        assert_eq!(
            registry.pack(&sample_mint()),
            Err(CodecError::Unregistered(MSG_MINT_TYPE_URL.to_string()))
        );

        // Message registered but embedded payload type is not.
        let registry = EncodingRegistry::new().register(MSG_MINT_TYPE_URL);
        assert_eq!(
            registry.pack(&sample_mint()),
            Err(CodecError::Unregistered(DATA_DYNAMIC_TYPE_URL.to_string()))
        );
    }

    #[test]
    fn test_nft_data_any() {
        let data = NftData::Bytes(DataBytes { data: b"raw".to_vec() });
        let any = data.to_any();
        assert_eq!(any.type_url, DATA_BYTES_TYPE_URL);
        assert_eq!(NftData::from_any(&any).unwrap(), data);

        let unknown = prost_types::Any {
            type_url: "/unknown.Type".into(),
            value: vec![],
        };
        assert!(matches!(NftData::from_any(&unknown), Err(CodecError::Unregistered(_))));
    }

    #[test]
    fn test_signer() {
        assert_eq!(sample_mint().signer(), "devcore1sender");
        assert_eq!(sample_mint().operation(), "mint");
    }
}
