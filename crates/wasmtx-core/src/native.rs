//! Native (built-in) contracts
//!
//! Native contracts are implemented by the node rather than deployed as
//! bytecode. They skip the code/ABI existence check during admission and
//! their ABIs come from this registry instead of the store.

use std::collections::BTreeMap;

use crate::name::Name;

/// Account of the system contract
pub const SYSTEM_CONTRACT: Name = Name(16262822953962438656); // wasmio

/// Account of the native token contract
pub const BANK_CONTRACT: Name = Name(16262822954083344384); // wasmio.bank

/// Reserved action that uploads contract code; its payload is never decoded
pub const SETCODE_ACTION: Name = Name(14029427681804681216); // setcode

const SYSTEM_ABI: &str = r#"{
    "version": "wasm::abi/1.0",
    "structs": [
        {"name": "setcode", "base": "", "fields": [
            {"name": "account", "type": "name"},
            {"name": "code", "type": "bytes"},
            {"name": "abi", "type": "bytes"},
            {"name": "memo", "type": "string"}
        ]}
    ],
    "actions": [{"name": "setcode", "type": "setcode"}]
}"#;

const BANK_ABI: &str = r#"{
    "version": "wasm::abi/1.0",
    "structs": [
        {"name": "transfer", "base": "", "fields": [
            {"name": "from", "type": "name"},
            {"name": "to", "type": "name"},
            {"name": "quantity", "type": "asset"},
            {"name": "memo", "type": "string"}
        ]}
    ],
    "actions": [{"name": "transfer", "type": "transfer"}]
}"#;

/// Read-only lookup of built-in contracts, injected wherever it is needed
pub trait NativeAbiRegistry {
    fn is_native(&self, contract: Name) -> bool;

    fn lookup_native_abi(&self, contract: Name) -> Option<Vec<u8>>;
}

/// Table of native contracts and their ABI documents
#[derive(Debug, Clone)]
pub struct NativeContracts {
    abis: BTreeMap<Name, Vec<u8>>,
}

impl NativeContracts {
    /// Registry with no native contracts
    pub fn empty() -> Self {
        NativeContracts {
            abis: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, contract: Name, abi: Vec<u8>) {
        self.abis.insert(contract, abi);
    }
}

impl Default for NativeContracts {
    fn default() -> Self {
        let mut natives = Self::empty();
        natives.register(SYSTEM_CONTRACT, SYSTEM_ABI.as_bytes().to_vec());
        natives.register(BANK_CONTRACT, BANK_ABI.as_bytes().to_vec());
        natives
    }
}

impl NativeAbiRegistry for NativeContracts {
    fn is_native(&self, contract: Name) -> bool {
        self.abis.contains_key(&contract)
    }

    fn lookup_native_abi(&self, contract: Name) -> Option<Vec<u8>> {
        self.abis.get(&contract).cloned()
    }
}
