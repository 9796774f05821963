//! Execution traces
//!
//! A `TransactionTrace` holds one `InlineTransactionTrace` per top-level
//! inline transaction. Each inline trace nests the traces of the inline
//! transactions its code issued, so the tree mirrors the call graph.

use std::time::Duration;

use crate::name::Name;
use crate::transaction::TxId;
use crate::InlineTransaction;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineTransactionTrace {
    /// Id of the originating top-level transaction
    pub trx_id: TxId,
    /// Contract whose code handled this invocation
    pub receiver: Name,
    /// The invocation itself, echoed back
    pub trx: InlineTransaction,
    /// Console output produced by the engine
    pub console: String,
    pub inline_traces: Vec<InlineTransactionTrace>,
}

impl InlineTransactionTrace {
    /// Number of traces in this subtree, including itself
    pub fn count(&self) -> usize {
        1 + self.inline_traces.iter().map(Self::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTrace {
    pub trx_id: TxId,
    /// Chargeable time measured by the billing timer
    pub elapsed: Duration,
    pub traces: Vec<InlineTransactionTrace>,
}

impl TransactionTrace {
    pub fn new(trx_id: TxId) -> Self {
        TransactionTrace {
            trx_id,
            elapsed: Duration::ZERO,
            traces: Vec::new(),
        }
    }
}
