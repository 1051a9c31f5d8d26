//! The `check → accept → connect` validator pipeline for transactions
//! and blocks, and the injected `VerifyScript` contract (spec.md §4.5,
//! §4.6).

pub mod block;
pub mod script;
pub mod transaction;

pub use block::ValidateBlock;
pub use script::{AlwaysAccept, ScriptVerifyResult, VerifyScript};
pub use transaction::ValidateTransaction;
