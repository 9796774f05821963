//! Error types for the wasm contract transaction engine
//!
//! All fallible operations return `Result<T, Error>`. Every variant maps to
//! a stable numeric code so that rejections can be reported to the caller
//! without losing their kind.

use thiserror::Error;

/// Rejection and failure kinds raised while admitting or executing a
/// wasm contract transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Structurally invalid transaction (e.g. no inline transactions).
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// Rejected by the shared envelope checks (fee symbol, sender, height, signature).
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// A referenced contract has no account or no deployed contract record.
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    /// A referenced contract is deployed without code or ABI.
    #[error("contract incomplete: {0}")]
    ContractIncomplete(String),

    /// Paid fee does not cover the minimum fee or the computed fuel cost.
    #[error("insufficient fee: {0}")]
    InsufficientFee(String),

    /// Sender account is unknown or has no owner key on record.
    #[error("unregistered account: {0}")]
    UnregisteredAccount(String),

    /// An inline transaction is authorized by someone other than the sender.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The execution engine failed while running an inline transaction.
    #[error("execution failure ({code}): {message}")]
    ExecutionFailure { code: u64, message: String },

    /// No minimum fee is configured for the fee symbol at this height.
    #[error("fee schedule unavailable: {0}")]
    FeeScheduleUnavailable(String),

    /// Binary payload could not be decoded against an ABI.
    #[error("abi decode error: {0}")]
    AbiDecode(String),

    /// Input document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Build an engine-reported execution failure.
    pub fn execution(code: u64, message: impl Into<String>) -> Self {
        Error::ExecutionFailure {
            code,
            message: message.into(),
        }
    }

    /// Stable numeric code reported alongside a rejection.
    pub fn code(&self) -> u64 {
        match self {
            Error::MalformedTransaction(_) => 3_050_001,
            Error::InvalidEnvelope(_) => 3_050_002,
            Error::ContractNotFound(_) => 3_050_003,
            Error::ContractIncomplete(_) => 3_050_004,
            Error::InsufficientFee(_) => 3_050_005,
            Error::UnregisteredAccount(_) => 3_050_006,
            Error::AuthorizationDenied(_) => 3_050_007,
            Error::ExecutionFailure { code, .. } => *code,
            Error::FeeScheduleUnavailable(_) => 3_050_009,
            Error::AbiDecode(_) => 3_015_000,
            Error::Parse(_) => 3_015_001,
        }
    }

    /// Short machine-readable kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedTransaction(_) => "MalformedTransaction",
            Error::InvalidEnvelope(_) => "InvalidEnvelope",
            Error::ContractNotFound(_) => "ContractNotFound",
            Error::ContractIncomplete(_) => "ContractIncomplete",
            Error::InsufficientFee(_) => "InsufficientFee",
            Error::UnregisteredAccount(_) => "UnregisteredAccount",
            Error::AuthorizationDenied(_) => "AuthorizationDenied",
            Error::ExecutionFailure { .. } => "ExecutionFailure",
            Error::FeeScheduleUnavailable(_) => "FeeScheduleUnavailable",
            Error::AbiDecode(_) => "AbiDecode",
            Error::Parse(_) => "Parse",
        }
    }

    /// Only a misconfigured fee schedule is allowed to escape `check_tx`.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::FeeScheduleUnavailable(_))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;
