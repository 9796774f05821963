//! Execution context handed in by the surrounding transaction framework
//!
//! Bundles chain height and fuel rate with borrowed handles to the store,
//! the rejection/return sink, the native-contract registry, the fee schedule
//! and the shared envelope checks.

use crate::config::{ChainConfig, FeeSchedule};
use crate::native::NativeAbiRegistry;
use crate::store::Store;
use crate::transaction::WasmContractTransaction;
use crate::{Error, Result};

// ── Validation state ──────────────────────────────────────

/// A recorded rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub dos_level: u32,
    pub code: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Collects the outcome of `check_tx` / `execute_tx`: the first rejection
/// and the execution return payload
#[derive(Debug, Clone, Default)]
pub struct ValidationState {
    rejection: Option<Rejection>,
    return_value: Option<String>,
}

impl ValidationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejection. Always returns `false` so callers can
    /// `return state.dos(..)`. Only the first rejection is kept.
    pub fn dos(&mut self, dos_level: u32, err: &Error) -> bool {
        if self.rejection.is_none() {
            self.rejection = Some(Rejection {
                dos_level,
                code: err.code(),
                kind: err.kind(),
                message: err.to_string(),
            });
        }
        false
    }

    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    pub fn set_return(&mut self, value: String) {
        self.return_value = Some(value);
    }

    pub fn return_value(&self) -> Option<&str> {
        self.return_value.as_deref()
    }
}

// ── Envelope checks ───────────────────────────────────────

/// Checks owned by the shared transaction framework: fee floor, valid-height
/// window, sender form and signature
pub trait EnvelopeVerifier {
    fn check_fee(&self, tx: &WasmContractTransaction, height: u32, fees: &dyn FeeSchedule) -> Result<()>;

    fn check_valid_height(&self, tx: &WasmContractTransaction, height: u32) -> Result<()>;

    fn check_sender(&self, tx: &WasmContractTransaction) -> Result<()>;

    fn check_signature(&self, tx: &WasmContractTransaction, owner_pubkey: &[u8]) -> Result<()>;
}

/// Structural envelope checks. Signature cryptography is left to a
/// framework-provided verifier; this one only requires a signature.
#[derive(Debug, Clone)]
pub struct BasicEnvelopeVerifier {
    pub tx_cache_height: u32,
}

impl BasicEnvelopeVerifier {
    pub fn from_config(config: &ChainConfig) -> Self {
        BasicEnvelopeVerifier {
            tx_cache_height: config.tx_cache_height,
        }
    }
}

impl Default for BasicEnvelopeVerifier {
    fn default() -> Self {
        Self::from_config(&ChainConfig::default())
    }
}

impl EnvelopeVerifier for BasicEnvelopeVerifier {
    fn check_fee(&self, tx: &WasmContractTransaction, height: u32, fees: &dyn FeeSchedule) -> Result<()> {
        let min_fee = fees
            .min_fee(tx.tx_type(), height, &tx.fee_symbol)
            .ok_or_else(|| {
                Error::InvalidEnvelope(format!("unsupported fee symbol {}", tx.fee_symbol))
            })?;
        if tx.fees < min_fee {
            return Err(Error::InsufficientFee(format!(
                "fees {} {} below minimum {}",
                tx.fees, tx.fee_symbol, min_fee
            )));
        }
        Ok(())
    }

    fn check_valid_height(&self, tx: &WasmContractTransaction, height: u32) -> Result<()> {
        if tx.valid_height.abs_diff(height) > self.tx_cache_height {
            return Err(Error::InvalidEnvelope(format!(
                "valid height {} outside window of {} around {}",
                tx.valid_height, self.tx_cache_height, height
            )));
        }
        Ok(())
    }

    fn check_sender(&self, tx: &WasmContractTransaction) -> Result<()> {
        match &tx.sender {
            crate::store::UserId::RegId(id) if !id.is_empty() => Ok(()),
            other => Err(Error::InvalidEnvelope(format!(
                "sender {} must be a registered regid",
                other
            ))),
        }
    }

    fn check_signature(&self, tx: &WasmContractTransaction, owner_pubkey: &[u8]) -> Result<()> {
        if owner_pubkey.is_empty() || tx.signature.is_empty() {
            return Err(Error::InvalidEnvelope("missing signature".into()));
        }
        Ok(())
    }
}

// ── Context ───────────────────────────────────────────────

pub struct TxExecuteContext<'a> {
    pub height: u32,
    pub fuel_rate: u32,
    pub dos_level: u32,
    pub store: &'a mut dyn Store,
    pub state: &'a mut ValidationState,
    pub natives: &'a dyn NativeAbiRegistry,
    pub fees: &'a dyn FeeSchedule,
    pub envelope: &'a dyn EnvelopeVerifier,
}

impl<'a> TxExecuteContext<'a> {
    pub fn new(
        store: &'a mut dyn Store,
        state: &'a mut ValidationState,
        natives: &'a dyn NativeAbiRegistry,
        fees: &'a dyn FeeSchedule,
        envelope: &'a dyn EnvelopeVerifier,
    ) -> Self {
        TxExecuteContext {
            height: 0,
            fuel_rate: 0,
            dos_level: 100,
            store,
            state,
            natives,
            fees,
            envelope,
        }
    }

    pub fn at_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_fuel_rate(mut self, fuel_rate: u32) -> Self {
        self.fuel_rate = fuel_rate;
        self
    }

    pub fn with_dos_level(mut self, dos_level: u32) -> Self {
        self.dos_level = dos_level;
        self
    }
}
