//! Scripted reference engine
//!
//! A deterministic `ExecutionEngine` used by the CLI and the tests in place
//! of a bytecode interpreter. Behaviour is looked up by `receiver::action`:
//! each script may print console text, notify other receivers, issue further
//! inline transactions or fail with an engine error code. The native
//! `wasmio::setcode` action deploys code and ABI into the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::Reader;
use crate::dispatcher::{CallContext, ExecutionEngine};
use crate::name::Name;
use crate::native::{SETCODE_ACTION, SYSTEM_CONTRACT};
use crate::store::{ContractRecord, UserId};
use crate::{Error, InlineTransaction, Result};

/// Engine error code for exceeding the call-depth bound
pub const DEPTH_EXCEEDED: u64 = 3_100_001;

/// Engine error code for a failed `setcode`
pub const SETCODE_FAILED: u64 = 3_100_002;

/// Behaviour of one `receiver::action` pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub console: String,
    /// Receivers notified with the same inline transaction, in order
    #[serde(default)]
    pub notify: Vec<Name>,
    /// Inline transactions issued after the notifications, in order
    #[serde(default)]
    pub inline: Vec<InlineTransaction>,
    #[serde(default)]
    pub fail: Option<ScriptFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptFailure {
    pub code: u64,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    scripts: BTreeMap<(Name, Name), Script>,
    max_depth: u32,
}

impl ScriptedEngine {
    pub fn new(max_depth: u32) -> Self {
        ScriptedEngine {
            scripts: BTreeMap::new(),
            max_depth,
        }
    }

    pub fn with_script(mut self, receiver: Name, action: Name, script: Script) -> Self {
        self.scripts.insert((receiver, action), script);
        self
    }

    /// Load scripts from a JSON object keyed by `"receiver::action"`
    pub fn from_json(text: &str, max_depth: u32) -> Result<Self> {
        let raw: BTreeMap<String, Script> =
            serde_json::from_str(text).map_err(|e| Error::Parse(format!("engine scripts: {}", e)))?;
        let mut engine = Self::new(max_depth);
        for (key, script) in raw {
            let (receiver, action) = key.split_once("::").ok_or_else(|| {
                Error::Parse(format!("script key '{}' must look like receiver::action", key))
            })?;
            engine
                .scripts
                .insert((Name::new(receiver)?, Name::new(action)?), script);
        }
        Ok(engine)
    }

    fn setcode(&self, ctx: &mut CallContext<'_>) -> Result<()> {
        let data = &ctx.inline_transaction().data;
        let mut reader = Reader::new(data);
        let decoded = (|| -> Result<_> {
            let account = Name(reader.read_u64()?);
            let code = reader.read_blob()?.to_vec();
            let abi = reader.read_blob()?.to_vec();
            let _memo = reader.read_string()?;
            Ok((account, code, abi))
        })();
        let (account, code, abi) =
            decoded.map_err(|e| Error::execution(SETCODE_FAILED, format!("bad setcode payload: {}", e)))?;

        // only the target account may replace its own code
        let authorized = ctx
            .inline_transaction()
            .authorization
            .iter()
            .any(|permission| permission.account == account);
        if !authorized {
            return Err(Error::execution(
                SETCODE_FAILED,
                format!("setcode for {} is not authorized by {}", account, account),
            ));
        }

        let owner = ctx
            .store()
            .get_account(&UserId::NickId(account))
            .ok_or_else(|| Error::execution(SETCODE_FAILED, format!("account {} does not exist", account)))?;
        debug!(account = %account, code_len = code.len(), abi_len = abi.len(), "deploying contract");
        ctx.store_mut().set_contract(owner.regid, ContractRecord { code, abi });
        ctx.console(&format!("deployed {}", account));
        Ok(())
    }
}

impl ExecutionEngine for ScriptedEngine {
    fn execute(&self, ctx: &mut CallContext<'_>) -> Result<()> {
        if ctx.depth() > self.max_depth {
            return Err(Error::execution(
                DEPTH_EXCEEDED,
                format!("inline depth {} exceeds limit {}", ctx.depth(), self.max_depth),
            ));
        }

        let action = ctx.inline_transaction().action;
        if ctx.receiver() == SYSTEM_CONTRACT && action == SETCODE_ACTION {
            return self.setcode(ctx);
        }

        let Some(script) = self.scripts.get(&(ctx.receiver(), action)) else {
            return Ok(());
        };
        ctx.console(&script.console);
        if let Some(fail) = &script.fail {
            return Err(Error::execution(fail.code, fail.message.clone()));
        }
        for recipient in &script.notify {
            ctx.require_recipient(*recipient)?;
        }
        for inline_tx in &script.inline {
            ctx.send_inline(inline_tx)?;
        }
        Ok(())
    }
}
