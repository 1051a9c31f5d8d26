//! Error taxonomy for the validating core (spec.md §6.4, §7).
//!
//! Validation failures, storage faults, lifecycle, and policy rejections
//! are distinct categories so callers can branch on them instead of
//! grepping error strings.

use thiserror::Error;

/// Errors surfaced out of the consensus core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("service stopped")]
    ServiceStopped,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unspent-duplicate (BIP30) collision for tx {0}")]
    UnspentDuplicate(String),

    #[error("missing previous output for input {0}:{1}")]
    MissingPreviousOutput(String, u32),

    #[error("transaction {0} exceeds max sigchecks ({1} > {2})")]
    TransactionSigchecksLimit(String, u32, u32),

    #[error("chain state unavailable (operation_failed_23)")]
    ChainStateUnavailable,

    #[error("storage fault: {0}")]
    StorageFault(String),

    #[error("block check failed: {0}")]
    BlockCheckFailed(String),

    #[error("block accept failed: {0}")]
    BlockAcceptFailed(String),

    #[error("block connect failed: {0}")]
    BlockConnectFailed(String),

    #[error("transaction check failed: {0}")]
    TxCheckFailed(String),

    #[error("transaction accept failed: {0}")]
    TxAcceptFailed(String),

    #[error("transaction connect failed: {0}")]
    TxConnectFailed(String),

    #[error("script verification failed for input {0}: code {1}")]
    ScriptVerifyFailed(u32, i32),

    #[error("duplicated transaction")]
    DuplicatedTransaction,

    #[error("double spend within mempool: {0}")]
    DoubleSpendMempool(String),

    #[error("double spend against blockchain: {0}")]
    DoubleSpendBlockchain(String),

    #[error("transaction provides insufficient benefit to evict a mempool occupant")]
    LowBenefitTransaction,

    #[error("reorganization depth {depth} exceeds maximum {max}")]
    ReorgTooDeep { depth: u64, max: u64 },

    #[error("competing branch work {theirs} does not exceed current work {ours}")]
    InsufficientWork { ours: u128, theirs: u128 },

    #[error("already pooled or already present")]
    AlreadyPresent,

    #[error("orphan: parent not found for block {0}")]
    Orphan(String),

    #[error("success")]
    Success,
}

pub type CoreResult<T> = Result<T, CoreError>;
