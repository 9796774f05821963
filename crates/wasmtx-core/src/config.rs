//! Chain configuration: minimum-fee schedule and admission limits
//!
//! Loaded from a JSON document; every field has a default so a partial
//! document (or `{}`) is valid.

use serde::{Deserialize, Serialize};

use crate::transaction::TxType;
use crate::{Error, Result};

/// Minimum-fee lookup used by admission and fuel computation
pub trait FeeSchedule {
    /// Minimum fee for a transaction type paid in `fee_symbol` at `height`,
    /// or `None` when the combination is unsupported.
    fn min_fee(&self, tx_type: TxType, height: u32, fee_symbol: &str) -> Option<u64>;
}

/// One step of the fee schedule, active from `since_height` onwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinFeeEntry {
    pub tx_type: TxType,
    pub fee_symbol: String,
    #[serde(default)]
    pub since_height: u32,
    pub min_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Minimum fees per (tx type, fee symbol), stepped by height
    pub fee_schedule: Vec<MinFeeEntry>,
    /// Accepted distance between a transaction's valid height and the tip
    pub tx_cache_height: u32,
    /// DoS score attached to every rejection
    pub dos_level: u32,
    /// Call depth above which the reference engine refuses to run
    pub max_inline_depth: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            fee_schedule: vec![
                MinFeeEntry {
                    tx_type: TxType::WASM_CONTRACT,
                    fee_symbol: "WICC".into(),
                    since_height: 0,
                    min_fee: 10_000,
                },
                MinFeeEntry {
                    tx_type: TxType::WASM_CONTRACT,
                    fee_symbol: "WUSD".into(),
                    since_height: 0,
                    min_fee: 10_000,
                },
            ],
            tx_cache_height: 500,
            dos_level: 100,
            max_inline_depth: 4,
        }
    }
}

impl ChainConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Parse(format!("chain config: {}", e)))
    }
}

impl FeeSchedule for ChainConfig {
    fn min_fee(&self, tx_type: TxType, height: u32, fee_symbol: &str) -> Option<u64> {
        self.fee_schedule
            .iter()
            .filter(|e| e.tx_type == tx_type && e.fee_symbol == fee_symbol && e.since_height <= height)
            .max_by_key(|e| e.since_height)
            .map(|e| e.min_fee)
    }
}
