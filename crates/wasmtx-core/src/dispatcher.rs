//! Recursive dispatch of inline transactions
//!
//! The dispatcher builds a `CallContext` for one inline transaction and hands
//! it to the execution engine. Whenever the running code issues another
//! inline transaction (or notifies another receiver) the context dispatches
//! it into a fresh nested trace at exactly `depth + 1`. The engine owns the
//! depth bound; this module only threads the depth through.

use tracing::trace;

use crate::name::Name;
use crate::store::Store;
use crate::timer::BillingTimer;
use crate::trace::InlineTransactionTrace;
use crate::transaction::TxId;
use crate::{InlineTransaction, Result};

/// Interpreter that runs contract code for one call context
pub trait ExecutionEngine {
    /// Run `ctx.inline_transaction()` against `ctx.receiver()`, writing
    /// console output and nested calls through the context.
    fn execute(&self, ctx: &mut CallContext<'_>) -> Result<()>;
}

#[derive(Clone, Copy)]
pub struct Dispatcher<'e> {
    engine: &'e dyn ExecutionEngine,
}

impl<'e> Dispatcher<'e> {
    pub fn new(engine: &'e dyn ExecutionEngine) -> Self {
        Dispatcher { engine }
    }

    /// Execute `inline_tx` against `receiver` and fill `trace`
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &self,
        trace: &mut InlineTransactionTrace,
        inline_tx: &InlineTransaction,
        receiver: Name,
        store: &mut dyn Store,
        timer: &mut BillingTimer,
        trx_id: TxId,
        depth: u32,
    ) -> Result<()> {
        trace!(
            depth,
            contract = %inline_tx.contract,
            action = %inline_tx.action,
            receiver = %receiver,
            "dispatching inline transaction"
        );

        trace.trx_id = trx_id;
        trace.receiver = receiver;
        trace.trx = inline_tx.clone();

        let mut ctx = CallContext {
            dispatcher: *self,
            trx_id,
            inline_tx,
            receiver,
            store,
            timer,
            trace,
            depth,
        };
        let result = self.engine.execute(&mut ctx);

        trace!(depth, receiver = %receiver, ok = result.is_ok(), "inline transaction finished");
        result
    }
}

/// Engine-facing view of one dispatch
pub struct CallContext<'a> {
    dispatcher: Dispatcher<'a>,
    trx_id: TxId,
    inline_tx: &'a InlineTransaction,
    receiver: Name,
    store: &'a mut dyn Store,
    timer: &'a mut BillingTimer,
    trace: &'a mut InlineTransactionTrace,
    depth: u32,
}

impl<'a> CallContext<'a> {
    pub fn trx_id(&self) -> TxId {
        self.trx_id
    }

    pub fn receiver(&self) -> Name {
        self.receiver
    }

    pub fn inline_transaction(&self) -> &'a InlineTransaction {
        self.inline_tx
    }

    /// Nesting level: 0 for top-level inline transactions
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn store(&self) -> &dyn Store {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn Store {
        &mut *self.store
    }

    /// Append to this call's console output
    pub fn console(&mut self, text: &str) {
        self.trace.console.push_str(text);
    }

    pub fn pause_billing_timer(&mut self) {
        self.timer.pause();
    }

    pub fn resume_billing_timer(&mut self) {
        self.timer.resume();
    }

    /// Issue a new inline transaction, handled by its own contract
    pub fn send_inline(&mut self, inline_tx: &InlineTransaction) -> Result<()> {
        self.dispatch_nested(inline_tx, inline_tx.contract)
    }

    /// Run the current inline transaction again with `recipient` as receiver
    pub fn require_recipient(&mut self, recipient: Name) -> Result<()> {
        let inline_tx = self.inline_tx;
        self.dispatch_nested(inline_tx, recipient)
    }

    fn dispatch_nested(&mut self, inline_tx: &InlineTransaction, receiver: Name) -> Result<()> {
        let index = self.trace.inline_traces.len();
        self.trace
            .inline_traces
            .push(InlineTransactionTrace::default());
        let child = &mut self.trace.inline_traces[index];
        self.dispatcher.dispatch(
            child,
            inline_tx,
            receiver,
            &mut *self.store,
            &mut *self.timer,
            self.trx_id,
            self.depth + 1,
        )
    }
}
