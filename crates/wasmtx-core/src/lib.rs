//! WasmTx Core - execution engine for wasm contract transactions
//!
//! A wasm contract transaction carries one or more inline transactions
//! (contract-action invocations) signed by a single sender. This crate admits
//! such a transaction, meters its execution, dispatches every inline
//! transaction recursively and renders the resulting trace.
//!
//! # Architecture
//!
//! ```text
//! WasmContractTransaction ─ check_tx → contracts, fuel, sender, authorization
//!            │
//!            └ execute_tx → BillingTimer + Dispatcher ─→ ExecutionEngine
//!                                  ↑                          │
//!                                  └── send_inline (depth+1) ─┘
//!                                            ↓
//!                             TransactionTrace → TraceSerializer → JSON
//! ```
//!
//! The account store, fee schedule, envelope checks, native-contract
//! registry and execution engine are collaborators supplied by the caller
//! through traits.
//!
//! # Guarantees
//!
//! - **Short-circuiting**: admission stops at the first failed check
//! - **Bounded**: nesting depth grows by exactly one per inline call
//! - **Atomic at this layer**: a failed execution yields no trace

pub mod abi;
pub mod codec;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod name;
pub mod native;
pub mod serializer;
pub mod store;
pub mod timer;
pub mod trace;
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_utils;

/// Version of the core library, reported by front ends next to their own
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, Result};
pub use name::Name;
pub use transaction::{TxId, TxType, WasmContractTransaction};

/// An (account, permission-name) pair authorizing an inline transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Permission {
    pub account: Name,
    pub permission: Name,
}

/// One contract-action invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InlineTransaction {
    pub contract: Name,
    pub action: Name,
    #[serde(default)]
    pub authorization: Vec<Permission>,
    /// Binary action arguments
    #[serde(default, with = "hex::serde")]
    pub data: Vec<u8>,
}
