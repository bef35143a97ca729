//! Signing identity and in-memory keyring.
//!
//! # Security
//! - The seed phrase is supplied by configuration and consumed on derivation
//! - Seed bytes are zeroized after the key is derived
//! - Keys are never logged or serialized

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bip39::{Language, Mnemonic};
use cosmrs::bip32::DerivationPath;
use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::crypto::PublicKey;
use cosmrs::tx::{Raw, SignDoc};
use cosmrs::AccountId;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::ledger::types::{BroadcastError, KeyDerivationError};

/// Supported key algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    #[default]
    Secp256k1,
}

/// BIP-44 path for the given coin type, first account, first address.
pub fn full_bip44_path(coin_type: u32) -> String {
    format!("m/44'/{}'/0'/0/0", coin_type)
}

/// Public half of a derived key.
#[derive(Clone)]
pub struct AccountIdentity {
    name: String,
    address: AccountId,
    public_key: PublicKey,
    hd_path: String,
    algorithm: KeyAlgorithm,
}

impl AccountIdentity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn hd_path(&self) -> &str {
        &self.hd_path
    }
}

impl fmt::Debug for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountIdentity")
            .field("name", &self.name)
            .field("address", &self.address.to_string())
            .field("hd_path", &self.hd_path)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

struct KeyEntry {
    identity: AccountIdentity,
    signing_key: SigningKey,
}

/// In-memory keyring.
///
/// Populated during setup and then shared read-only behind an `Arc`.
pub struct Keyring {
    address_prefix: String,
    entries: BTreeMap<String, KeyEntry>,
}

impl Keyring {
    /// Create an empty keyring producing addresses with the given bech32 prefix.
    pub fn in_memory(address_prefix: impl Into<String>) -> Self {
        Self {
            address_prefix: address_prefix.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Derive a key from a seed phrase and store it under `name`.
    ///
    /// # Arguments
    /// * `name` - Label the key is stored under
    /// * `mnemonic` - BIP-39 English seed phrase
    /// * `passphrase` - Optional BIP-39 passphrase (empty string for none)
    /// * `hd_path` - Five-level BIP-44 path, e.g. `m/44'/990'/0'/0/0`
    /// * `algorithm` - Key algorithm
    pub fn new_account(
        &mut self,
        name: &str,
        mnemonic: &str,
        passphrase: &str,
        hd_path: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<AccountIdentity, KeyDerivationError> {
        if self.entries.contains_key(name) {
            return Err(KeyDerivationError::DuplicateKey(name.to_string()));
        }

        let path = parse_bip44_path(hd_path)?;

        let mnemonic = Mnemonic::parse_in(Language::English, mnemonic.trim())
            .map_err(|e| KeyDerivationError::Mnemonic(e.to_string()))?;

        let mut seed = mnemonic.to_seed(passphrase);
        let derived = match algorithm {
            KeyAlgorithm::Secp256k1 => SigningKey::derive_from_path(&seed, &path),
        };
        seed.zeroize();
        let signing_key = derived.map_err(|e| KeyDerivationError::Derivation(e.to_string()))?;

        let public_key = signing_key.public_key();
        let address = public_key
            .account_id(&self.address_prefix)
            .map_err(|e| KeyDerivationError::Address(e.to_string()))?;

        let identity = AccountIdentity {
            name: name.to_string(),
            address,
            public_key,
            hd_path: hd_path.to_string(),
            algorithm,
        };

        tracing::info!(
            key = name,
            address = %identity.address,
            hd_path = hd_path,
            "Signing key derived"
        );

        self.entries.insert(
            name.to_string(),
            KeyEntry {
                identity: identity.clone(),
                signing_key,
            },
        );

        Ok(identity)
    }

    /// Find the key whose address is `address`.
    pub fn identity_by_address(&self, address: &AccountId) -> Option<&AccountIdentity> {
        self.entries
            .values()
            .map(|entry| &entry.identity)
            .find(|identity| identity.address == *address)
    }

    /// Sign a sign-doc with the key belonging to `address`.
    pub fn sign(&self, address: &AccountId, sign_doc: SignDoc) -> Result<Raw, BroadcastError> {
        let entry = self
            .entries
            .values()
            .find(|entry| entry.identity.address == *address)
            .ok_or_else(|| BroadcastError::Signing(format!("no key for address {}", address)))?;

        sign_doc
            .sign(&entry.signing_key)
            .map_err(|e| BroadcastError::Signing(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("address_prefix", &self.address_prefix)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse and check a `m/44'/coin'/account'/change/index` path.
fn parse_bip44_path(hd_path: &str) -> Result<DerivationPath, KeyDerivationError> {
    let unsupported = |reason: &str| KeyDerivationError::UnsupportedPath {
        path: hd_path.to_string(),
        reason: reason.to_string(),
    };

    let path = DerivationPath::from_str(hd_path).map_err(|e| unsupported(&e.to_string()))?;
    let levels: Vec<_> = path.iter().collect();

    if levels.len() != 5 {
        return Err(unsupported("expected five levels"));
    }
    if levels[0].index() != 44 || !levels[0].is_hardened() {
        return Err(unsupported("purpose must be 44'"));
    }
    if !levels[1].is_hardened() || !levels[2].is_hardened() {
        return Err(unsupported("coin type and account must be hardened"));
    }

    Ok(path)
}
