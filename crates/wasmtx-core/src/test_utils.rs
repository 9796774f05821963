//! Shared builders for unit tests

use crate::codec::Writer;
use crate::config::ChainConfig;
use crate::context::{BasicEnvelopeVerifier, TxExecuteContext, ValidationState};
use crate::native::NativeContracts;
use crate::store::{Account, ContractRecord, KeyId, MemoryStore, RegId, Store, UserId};
use crate::{InlineTransaction, Name, Permission, WasmContractTransaction};

pub const TOKEN_ABI: &str = r#"{
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

/// `4,WICC` packed as an asset symbol
const WICC_SYMBOL: u64 = 288_891_688_708;

pub fn name(text: &str) -> Name {
    Name::new(text).unwrap()
}

pub fn active(account: Name) -> Permission {
    Permission {
        account,
        permission: name("active"),
    }
}

/// Binary `transfer` arguments: alice → bob, `amount` at precision 4, memo "rent"
pub fn transfer_payload(amount: i64) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u64(name("alice").value())
        .write_u64(name("bob").value())
        .write_i64(amount)
        .write_u64(WICC_SYMBOL)
        .write_string("rent");
    w.into_bytes()
}

pub fn transfer_tx(authorizer: Name) -> InlineTransaction {
    InlineTransaction {
        contract: name("token"),
        action: name("transfer"),
        authorization: vec![active(authorizer)],
        data: transfer_payload(12345),
    }
}

/// alice (1-1, owner key), bob (1-2, no key), token (1-3, deployed)
pub fn sample_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_account(Account {
        regid: RegId::new(1, 1),
        nickid: Some(name("alice")),
        keyid: KeyId([1; 20]),
        owner_pubkey: Some(vec![0x02; 33]),
    });
    store.insert_account(Account {
        regid: RegId::new(1, 2),
        nickid: Some(name("bob")),
        keyid: KeyId([2; 20]),
        owner_pubkey: None,
    });
    store.insert_account(Account {
        regid: RegId::new(1, 3),
        nickid: Some(name("token")),
        keyid: KeyId([3; 20]),
        owner_pubkey: Some(vec![0x03; 33]),
    });
    store.set_contract(
        RegId::new(1, 3),
        ContractRecord {
            code: vec![0x00, 0x61, 0x73, 0x6d],
            abi: TOKEN_ABI.as_bytes().to_vec(),
        },
    );
    store
}

/// Signed by alice, valid at height 100, paying 100_000 WICC
pub fn sample_transaction(inline_transactions: Vec<InlineTransaction>) -> WasmContractTransaction {
    let mut tx = WasmContractTransaction::new(
        UserId::RegId(RegId::new(1, 1)),
        "WICC",
        100_000,
        100,
        inline_transactions,
    );
    tx.signature = vec![0x30; 71];
    tx
}

/// Owned collaborators behind a `TxExecuteContext`
pub struct Fixture {
    pub store: MemoryStore,
    pub state: ValidationState,
    pub natives: NativeContracts,
    pub config: ChainConfig,
    pub envelope: BasicEnvelopeVerifier,
}

impl Fixture {
    pub fn new() -> Self {
        let config = ChainConfig::default();
        Fixture {
            store: sample_store(),
            state: ValidationState::new(),
            natives: NativeContracts::default(),
            envelope: BasicEnvelopeVerifier::from_config(&config),
            config,
        }
    }

    /// Context at height 100 with a fuel rate of 1
    pub fn context(&mut self) -> TxExecuteContext<'_> {
        TxExecuteContext::new(
            &mut self.store,
            &mut self.state,
            &self.natives,
            &self.config,
            &self.envelope,
        )
        .at_height(100)
        .with_fuel_rate(1)
        .with_dos_level(self.config.dos_level)
    }
}
