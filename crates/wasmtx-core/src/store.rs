//! Account and contract store
//!
//! The engine borrows a `Store` from its caller: read-only during admission,
//! read-write during execution. `MemoryStore` is a map-backed implementation
//! loadable from a JSON snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::name::Name;
use crate::{Error, Result};

// ── Identities ────────────────────────────────────────────

/// Registration id: block height and index of the registering transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegId {
    pub height: u32,
    pub index: u16,
}

impl RegId {
    pub fn new(height: u32, index: u16) -> Self {
        RegId { height, index }
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 && self.index == 0
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.height, self.index)
    }
}

impl FromStr for RegId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (height, index) = s
            .split_once('-')
            .ok_or_else(|| Error::Parse(format!("regid '{}' must look like height-index", s)))?;
        let height = height
            .parse()
            .map_err(|e| Error::Parse(format!("regid '{}' height: {}", s, e)))?;
        let index = index
            .parse()
            .map_err(|e| Error::Parse(format!("regid '{}' index: {}", s, e)))?;
        Ok(RegId { height, index })
    }
}

impl Serialize for RegId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RegId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// 160-bit key id derived from an owner public key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyId(#[serde(with = "hex::serde")] pub [u8; 20]);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Any of the ways a transaction can name an account
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserId {
    RegId(RegId),
    NickId(Name),
    KeyId(KeyId),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::RegId(id) => write!(f, "{}", id),
            UserId::NickId(name) => write!(f, "{}", name),
            UserId::KeyId(key) => write!(f, "{}", key),
        }
    }
}

// ── Records ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub regid: RegId,
    #[serde(default)]
    pub nickid: Option<Name>,
    pub keyid: KeyId,
    #[serde(default, with = "opt_hex")]
    pub owner_pubkey: Option<Vec<u8>>,
}

impl Account {
    pub fn has_owner_pubkey(&self) -> bool {
        self.owner_pubkey.as_ref().is_some_and(|key| !key.is_empty())
    }

    pub fn matches(&self, uid: &UserId) -> bool {
        match uid {
            UserId::RegId(id) => self.regid == *id,
            UserId::NickId(name) => self.nickid == Some(*name),
            UserId::KeyId(key) => self.keyid == *key,
        }
    }
}

/// Deployed contract: wasm code plus its ABI document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractRecord {
    pub code: Vec<u8>,
    pub abi: Vec<u8>,
}

impl ContractRecord {
    pub fn is_complete(&self) -> bool {
        !self.code.is_empty() && !self.abi.is_empty()
    }
}

// ── Store ─────────────────────────────────────────────────

/// Account/contract store supplied by the caller
pub trait Store {
    fn get_account(&self, uid: &UserId) -> Option<Account>;

    fn get_contract(&self, regid: &RegId) -> Option<ContractRecord>;

    fn get_key_id(&self, uid: &UserId) -> Option<KeyId> {
        self.get_account(uid).map(|account| account.keyid)
    }

    fn set_contract(&mut self, regid: RegId, contract: ContractRecord);
}

/// In-memory store used by the CLI and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: BTreeMap<RegId, Account>,
    contracts: BTreeMap<RegId, ContractRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account.regid, account);
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let mut store = MemoryStore::new();
        for account in snapshot.accounts {
            store.insert_account(account);
        }
        for entry in snapshot.contracts {
            let abi = match entry.abi {
                serde_json::Value::Null => Vec::new(),
                serde_json::Value::String(text) => text.into_bytes(),
                document => serde_json::to_vec(&document)
                    .map_err(|e| Error::Parse(format!("contract {} abi: {}", entry.regid, e)))?,
            };
            store.set_contract(entry.regid, ContractRecord { code: entry.code, abi });
        }
        Ok(store)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: StoreSnapshot =
            serde_json::from_str(text).map_err(|e| Error::Parse(format!("store snapshot: {}", e)))?;
        Self::from_snapshot(snapshot)
    }
}

impl Store for MemoryStore {
    fn get_account(&self, uid: &UserId) -> Option<Account> {
        match uid {
            UserId::RegId(id) => self.accounts.get(id).cloned(),
            _ => self.accounts.values().find(|a| a.matches(uid)).cloned(),
        }
    }

    fn get_contract(&self, regid: &RegId) -> Option<ContractRecord> {
        self.contracts.get(regid).cloned()
    }

    fn set_contract(&mut self, regid: RegId, contract: ContractRecord) {
        self.contracts.insert(regid, contract);
    }
}

/// JSON form of a `MemoryStore`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub contracts: Vec<ContractEntry>,
}

/// Contract code as hex, ABI as an inline JSON document (or raw string)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEntry {
    pub regid: RegId,
    #[serde(with = "hex::serde")]
    pub code: Vec<u8>,
    #[serde(default)]
    pub abi: serde_json::Value,
}

mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| hex::decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
