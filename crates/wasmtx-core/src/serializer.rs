//! Trace serializer: renders traces as JSON documents
//!
//! Names are rendered in their string form. Action payloads are decoded
//! against the target contract's ABI when one is available; `setcode`
//! payloads, empty payloads and anything that fails to decode are rendered
//! as lowercase hex. Empty nested trace lists are omitted.

use serde_json::{Map, Value};

use crate::abi;
use crate::native::{NativeAbiRegistry, SETCODE_ACTION};
use crate::name::Name;
use crate::store::{Store, UserId};
use crate::trace::{InlineTransactionTrace, TransactionTrace};
use crate::{Error, InlineTransaction, Permission, Result};

/// Try to decode `data` as `action` arguments, falling back to raw hex
pub fn decode_or_hex(abi: Option<&[u8]>, action: Name, data: &[u8], max_depth: usize) -> Value {
    let hex_value = || Value::String(hex::encode(data));
    match abi {
        Some(abi) if !abi.is_empty() && !data.is_empty() && action != SETCODE_ACTION => {
            abi::unpack(abi, action, data, max_depth).unwrap_or_else(|_| hex_value())
        }
        _ => hex_value(),
    }
}

pub fn render_permission(permission: &Permission) -> Value {
    let mut obj = Map::new();
    obj.insert("account".into(), Value::String(permission.account.to_string()));
    obj.insert("permission".into(), Value::String(permission.permission.to_string()));
    Value::Object(obj)
}

/// Renders traces, resolving ABIs from the native registry and the store
pub struct TraceSerializer<'a> {
    store: &'a dyn Store,
    natives: &'a dyn NativeAbiRegistry,
    max_depth: usize,
}

impl<'a> TraceSerializer<'a> {
    pub fn new(store: &'a dyn Store, natives: &'a dyn NativeAbiRegistry) -> Self {
        TraceSerializer {
            store,
            natives,
            max_depth: abi::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// ABI of a native contract, or of the deployed contract bound to the
    /// account named `contract`
    pub fn abi_for(&self, contract: Name) -> Option<Vec<u8>> {
        if let Some(abi) = self.natives.lookup_native_abi(contract) {
            return Some(abi);
        }
        let account = self.store.get_account(&UserId::NickId(contract))?;
        let record = self.store.get_contract(&account.regid)?;
        Some(record.abi).filter(|abi| !abi.is_empty())
    }

    pub fn render_inline_transaction(&self, trx: &InlineTransaction) -> Value {
        let abi = self.abi_for(trx.contract);
        let mut obj = Map::new();
        obj.insert("contract".into(), Value::String(trx.contract.to_string()));
        obj.insert("action".into(), Value::String(trx.action.to_string()));
        obj.insert(
            "authorization".into(),
            Value::Array(trx.authorization.iter().map(render_permission).collect()),
        );
        obj.insert(
            "data".into(),
            decode_or_hex(abi.as_deref(), trx.action, &trx.data, self.max_depth),
        );
        Value::Object(obj)
    }

    pub fn render_inline_trace(&self, trace: &InlineTransactionTrace) -> Value {
        let mut obj = Map::new();
        obj.insert("trx_id".into(), Value::String(trace.trx_id.to_string()));
        obj.insert("receiver".into(), Value::String(trace.receiver.to_string()));
        obj.insert("trx".into(), self.render_inline_transaction(&trace.trx));
        obj.insert("console".into(), Value::String(trace.console.clone()));
        if !trace.inline_traces.is_empty() {
            obj.insert(
                "inline_traces".into(),
                Value::Array(
                    trace
                        .inline_traces
                        .iter()
                        .map(|t| self.render_inline_trace(t))
                        .collect(),
                ),
            );
        }
        Value::Object(obj)
    }

    pub fn render(&self, trace: &TransactionTrace) -> Value {
        let mut obj = Map::new();
        obj.insert("trx_id".into(), Value::String(trace.trx_id.to_string()));
        let elapsed_us = u64::try_from(trace.elapsed.as_micros()).unwrap_or(u64::MAX);
        obj.insert("elapsed".into(), Value::from(elapsed_us));
        if !trace.traces.is_empty() {
            obj.insert(
                "traces".into(),
                Value::Array(trace.traces.iter().map(|t| self.render_inline_trace(t)).collect()),
            );
        }
        Value::Object(obj)
    }

    /// Compact JSON text of a rendered trace
    pub fn to_json_string(&self, trace: &TransactionTrace) -> Result<String> {
        serde_json::to_string(&self.render(trace))
            .map_err(|e| Error::Parse(format!("trace serialization: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{NativeContracts, BANK_CONTRACT, SYSTEM_CONTRACT};
    use crate::store::{MemoryStore, RegId};
    use crate::test_utils::*;
    use std::time::Duration;

    fn trace_for(trx: InlineTransaction) -> InlineTransactionTrace {
        InlineTransactionTrace {
            receiver: trx.contract,
            trx,
            console: "ok".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decoded_payload_for_deployed_contract() {
        let store = sample_store();
        let natives = NativeContracts::default();
        let ser = TraceSerializer::new(&store, &natives);
        let rendered = ser.render_inline_transaction(&transfer_tx(name("alice")));
        assert_eq!(
            rendered["data"],
            serde_json::json!({"from": "alice", "to": "bob", "quantity": "1.2345 WICC", "memo": "rent"})
        );
        assert_eq!(
            rendered["authorization"],
            serde_json::json!([{"account": "alice", "permission": "active"}])
        );
        assert_eq!(rendered["contract"], "token");
        assert_eq!(rendered["action"], "transfer");
    }

    #[test]
    fn test_undecodable_payload_falls_back_to_hex() {
        let store = sample_store();
        let natives = NativeContracts::default();
        let ser = TraceSerializer::new(&store, &natives);
        let mut trx = transfer_tx(name("alice"));
        trx.data = vec![0xde, 0xad, 0xbe, 0xef];
        assert_eq!(ser.render_inline_transaction(&trx)["data"], "deadbeef");
    }

    #[test]
    fn test_setcode_and_empty_payloads_are_hex() {
        let store = sample_store();
        let natives = NativeContracts::default();
        let ser = TraceSerializer::new(&store, &natives);

        let setcode = InlineTransaction {
            contract: SYSTEM_CONTRACT,
            action: SETCODE_ACTION,
            authorization: vec![active(name("alice"))],
            data: transfer_payload(1),
        };
        assert_eq!(
            ser.render_inline_transaction(&setcode)["data"],
            Value::String(hex::encode(transfer_payload(1)))
        );

        let mut empty = transfer_tx(name("alice"));
        empty.data.clear();
        assert_eq!(ser.render_inline_transaction(&empty)["data"], "");
    }

    #[test]
    fn test_native_abi_used_without_store_entry() {
        let store = MemoryStore::new();
        let natives = NativeContracts::default();
        let ser = TraceSerializer::new(&store, &natives);
        let mut trx = transfer_tx(name("alice"));
        trx.contract = BANK_CONTRACT;
        assert_eq!(ser.render_inline_transaction(&trx)["data"]["quantity"], "1.2345 WICC");
    }

    #[test]
    fn test_unknown_contract_renders_hex() {
        let store = MemoryStore::new();
        let natives = NativeContracts::empty();
        let ser = TraceSerializer::new(&store, &natives);
        let trx = transfer_tx(name("alice"));
        assert!(ser.abi_for(trx.contract).is_none());
        assert_eq!(
            ser.render_inline_transaction(&trx)["data"],
            Value::String(hex::encode(&trx.data))
        );
    }

    #[test]
    fn test_nested_traces_and_omitted_fields() {
        let store = sample_store();
        let natives = NativeContracts::default();
        let ser = TraceSerializer::new(&store, &natives);

        let mut parent = trace_for(transfer_tx(name("alice")));
        parent.inline_traces.push(trace_for(transfer_tx(name("alice"))));
        let trace = TransactionTrace {
            elapsed: Duration::from_micros(1_250),
            traces: vec![parent],
            ..Default::default()
        };

        let doc = ser.render(&trace);
        assert_eq!(doc["elapsed"], 1_250);
        let top = &doc["traces"][0];
        assert_eq!(top["receiver"], "token");
        assert_eq!(top["console"], "ok");
        let nested = top["inline_traces"].as_array().unwrap();
        assert_eq!(nested.len(), 1);
        assert!(nested[0].get("inline_traces").is_none());

        let empty = ser.render(&TransactionTrace::default());
        assert!(empty.get("traces").is_none());
        assert_eq!(empty["trx_id"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_incomplete_contract_abi_not_used() {
        let mut store = sample_store();
        store.set_contract(RegId::new(1, 3), crate::store::ContractRecord { code: vec![1], abi: vec![] });
        let natives = NativeContracts::default();
        let ser = TraceSerializer::new(&store, &natives);
        assert!(ser.abi_for(name("token")).is_none());
    }
}
