//! Wasm contract transaction
//!
//! `WasmContractTransaction` carries one or more inline transactions signed
//! by a single sender. `check_tx` runs the admission checks in order and
//! stops at the first failure; `execute_tx` dispatches every inline
//! transaction at depth 0 and stores the rendered trace as the return value.
//!
//! Rejections are recorded in the context's `ValidationState`. Only a fee
//! schedule that cannot price the transaction escapes as an `Err`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{error, trace};

use crate::codec::Writer;
use crate::config::FeeSchedule;
use crate::context::TxExecuteContext;
use crate::dispatcher::{Dispatcher, ExecutionEngine};
use crate::name::Name;
use crate::native::NativeAbiRegistry;
use crate::serializer::TraceSerializer;
use crate::store::{KeyId, Store, UserId};
use crate::timer::{BillingTimer, Clock};
use crate::trace::{InlineTransactionTrace, TransactionTrace};
use crate::{Error, InlineTransaction, Result};

// ── Identity ──────────────────────────────────────────────

/// Transaction type tag shared with the rest of the transaction framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxType(pub u8);

impl TxType {
    pub const WASM_CONTRACT: TxType = TxType(15);
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TxType::WASM_CONTRACT => f.write_str("WASM_CONTRACT_TX"),
            TxType(other) => write!(f, "TX_TYPE_{}", other),
        }
    }
}

/// Double SHA-256 of the unsigned transaction encoding
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(pub [u8; 32]);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self)
    }
}

// ── Transaction ───────────────────────────────────────────

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasmContractTransaction {
    #[serde(default = "default_version")]
    pub version: u32,
    pub valid_height: u32,
    pub sender: UserId,
    pub fee_symbol: String,
    pub fees: u64,
    /// Steps consumed by the engine, priced by the fuel rate
    #[serde(default)]
    pub run_steps: u64,
    pub inline_transactions: Vec<InlineTransaction>,
    #[serde(default, with = "hex::serde")]
    pub signature: Vec<u8>,
    #[serde(skip)]
    billing_timer: BillingTimer,
}

impl WasmContractTransaction {
    pub fn new(
        sender: UserId,
        fee_symbol: impl Into<String>,
        fees: u64,
        valid_height: u32,
        inline_transactions: Vec<InlineTransaction>,
    ) -> Self {
        WasmContractTransaction {
            version: default_version(),
            valid_height,
            sender,
            fee_symbol: fee_symbol.into(),
            fees,
            run_steps: 0,
            inline_transactions,
            signature: Vec::new(),
            billing_timer: BillingTimer::new(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Parse(format!("transaction: {}", e)))
    }

    /// Replace the billing timer's time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.billing_timer = BillingTimer::with_clock(clock);
        self
    }

    pub fn tx_type(&self) -> TxType {
        TxType::WASM_CONTRACT
    }

    pub fn billing_timer(&self) -> &BillingTimer {
        &self.billing_timer
    }

    pub fn id(&self) -> TxId {
        let mut w = Writer::new();
        w.write_varuint32(self.version)
            .write_u8(self.tx_type().0)
            .write_u32(self.valid_height);
        match &self.sender {
            UserId::RegId(id) => w.write_u8(0).write_u32(id.height).write_u16(id.index),
            UserId::NickId(name) => w.write_u8(1).write_u64(name.value()),
            UserId::KeyId(key) => w.write_u8(2).write_blob(&key.0),
        };
        w.write_string(&self.fee_symbol).write_u64(self.fees);
        w.write_varuint32(len_u32(self.inline_transactions.len()));
        for trx in &self.inline_transactions {
            w.write_u64(trx.contract.value()).write_u64(trx.action.value());
            w.write_varuint32(len_u32(trx.authorization.len()));
            for permission in &trx.authorization {
                w.write_u64(permission.account.value())
                    .write_u64(permission.permission.value());
            }
            w.write_blob(&trx.data);
        }
        TxId(Sha256::digest(Sha256::digest(w.as_bytes())).into())
    }

    // ── Admission ─────────────────────────────────────────

    /// Run the admission checks. Returns `Ok(false)` after recording a
    /// rejection in `ctx.state`; `Err` only for a fatal misconfiguration.
    pub fn check_tx(&self, ctx: &mut TxExecuteContext<'_>) -> Result<bool> {
        match self.admit(ctx) {
            Ok(()) => Ok(true),
            Err(err) if err.is_fatal() => {
                error!(txid = %self.id(), error = %err, "cannot price transaction");
                Err(err)
            }
            Err(err) => {
                trace!(txid = %self.id(), code = err.code(), error = %err, "transaction rejected");
                Ok(ctx.state.dos(ctx.dos_level, &err))
            }
        }
    }

    fn admit(&self, ctx: &TxExecuteContext<'_>) -> Result<()> {
        if self.inline_transactions.is_empty() {
            return Err(Error::MalformedTransaction("no inline transactions".into()));
        }

        ctx.envelope.check_fee(self, ctx.height, ctx.fees)?;
        ctx.envelope.check_valid_height(self, ctx.height)?;
        ctx.envelope.check_sender(self)?;

        self.contract_is_valid(&*ctx.store, ctx.natives)?;

        let fuel = self.fuel(ctx.height, ctx.fuel_rate, ctx.fees)?;
        if self.fees <= fuel {
            return Err(Error::InsufficientFee(format!(
                "fees {} {} do not exceed fuel cost {}",
                self.fees, self.fee_symbol, fuel
            )));
        }

        let sender = ctx
            .store
            .get_account(&self.sender)
            .ok_or_else(|| Error::UnregisteredAccount(format!("sender {} does not exist", self.sender)))?;
        let owner_pubkey = match sender.owner_pubkey.as_deref() {
            Some(key) if sender.has_owner_pubkey() => key,
            _ => {
                return Err(Error::UnregisteredAccount(format!(
                    "sender {} has no owner key",
                    self.sender
                )))
            }
        };
        ctx.envelope.check_signature(self, owner_pubkey)?;

        self.authorization_is_valid(sender.nickid, ctx.natives)
    }

    /// Every distinct non-native contract must be deployed with code and ABI
    pub fn contract_is_valid(&self, store: &dyn Store, natives: &dyn NativeAbiRegistry) -> Result<()> {
        let contracts: BTreeSet<Name> = self.inline_transactions.iter().map(|t| t.contract).collect();
        for contract in contracts {
            if natives.is_native(contract) {
                continue;
            }
            let account = store
                .get_account(&UserId::NickId(contract))
                .ok_or_else(|| Error::ContractNotFound(format!("no account named {}", contract)))?;
            let record = store
                .get_contract(&account.regid)
                .ok_or_else(|| Error::ContractNotFound(format!("{} ({}) has no contract", contract, account.regid)))?;
            if !record.is_complete() {
                return Err(Error::ContractIncomplete(format!(
                    "{} is missing code or abi",
                    contract
                )));
            }
        }
        Ok(())
    }

    /// Every authorization must name the sender; an empty list is accepted
    /// only for native contracts
    pub fn authorization_is_valid(&self, sender_nick: Option<Name>, natives: &dyn NativeAbiRegistry) -> Result<()> {
        for trx in &self.inline_transactions {
            if trx.authorization.is_empty() && !natives.is_native(trx.contract) {
                return Err(Error::AuthorizationDenied(format!(
                    "{}::{} carries no authorization",
                    trx.contract, trx.action
                )));
            }
            for permission in &trx.authorization {
                if Some(permission.account) != sender_nick {
                    return Err(Error::AuthorizationDenied(format!(
                        "{}@{} is not the sender",
                        permission.account, permission.permission
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fuel cost: `max(run_steps * fuel_rate / 100, min_fee)`
    pub fn fuel(&self, height: u32, fuel_rate: u32, fees: &dyn FeeSchedule) -> Result<u64> {
        let min_fee = fees
            .min_fee(self.tx_type(), height, &self.fee_symbol)
            .ok_or_else(|| {
                Error::FeeScheduleUnavailable(format!(
                    "no minimum fee for {} in {} at height {}",
                    self.tx_type(),
                    self.fee_symbol,
                    height
                ))
            })?;
        let scaled = u128::from(self.run_steps) * u128::from(fuel_rate) / 100;
        Ok(u64::try_from(scaled).unwrap_or(u64::MAX).max(min_fee))
    }

    // ── Execution ─────────────────────────────────────────

    /// Dispatch every inline transaction at depth 0 and collect the trace.
    /// The first engine error aborts the whole run.
    pub fn execute(&mut self, store: &mut dyn Store, engine: &dyn ExecutionEngine) -> Result<TransactionTrace> {
        let trx_id = self.id();
        let dispatcher = Dispatcher::new(engine);
        let mut trace = TransactionTrace::new(trx_id);

        self.billing_timer.start();
        for inline_tx in &self.inline_transactions {
            let index = trace.traces.len();
            trace.traces.push(InlineTransactionTrace::default());
            dispatcher.dispatch(
                &mut trace.traces[index],
                inline_tx,
                inline_tx.contract,
                &mut *store,
                &mut self.billing_timer,
                trx_id,
                0,
            )?;
        }
        trace.elapsed = self.billing_timer.elapsed();
        Ok(trace)
    }

    /// Execute and store the rendered trace as the return value. On failure
    /// the partial trace is dropped and the error recorded as a rejection.
    pub fn execute_tx(&mut self, ctx: &mut TxExecuteContext<'_>, engine: &dyn ExecutionEngine) -> bool {
        let trace = match self.execute(&mut *ctx.store, engine) {
            Ok(trace) => trace,
            Err(err) => {
                trace!(txid = %self.id(), code = err.code(), error = %err, "execution failed");
                return ctx.state.dos(ctx.dos_level, &err);
            }
        };
        let rendered = TraceSerializer::new(&*ctx.store, ctx.natives).render(&trace);
        ctx.state.set_return(rendered.to_string());
        true
    }

    // ── Views ─────────────────────────────────────────────

    pub fn summary(&self, store: &dyn Store) -> String {
        let (Some(first), Some(sender)) = (self.inline_transactions.first(), store.get_account(&self.sender)) else {
            return String::new();
        };
        let nick = sender.nickid.map(|n| n.to_string()).unwrap_or_default();
        format!(
            "txType={}, hash={}, ver={}, sender={}, fee_symbol={}, fees={}, contract={}, action={}, arguments={}, valid_height={}",
            self.tx_type(),
            self.id(),
            self.version,
            nick,
            self.fee_symbol,
            self.fees,
            first.contract,
            first.action,
            hex::encode(&first.data),
            self.valid_height
        )
    }

    pub fn to_json(&self, store: &dyn Store) -> Value {
        let Some(first) = self.inline_transactions.first() else {
            return json!({});
        };
        let addr = store
            .get_key_id(&self.sender)
            .map(|key| key.to_string())
            .unwrap_or_default();
        json!({
            "txid": self.id().to_string(),
            "tx_type": self.tx_type().to_string(),
            "ver": self.version,
            "tx_uid": self.sender.to_string(),
            "addr": addr,
            "fee_symbol": self.fee_symbol,
            "fees": self.fees,
            "valid_height": self.valid_height,
            "contract": first.contract.to_string(),
            "action": first.action.to_string(),
            "arguments": hex::encode(&first.data),
        })
    }

    pub fn involved_key_ids(&self, store: &dyn Store) -> Option<BTreeSet<KeyId>> {
        store.get_key_id(&self.sender).map(|key| BTreeSet::from([key]))
    }
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
