//! `VerifyScript`: the injected script-interpretation contract (spec.md
//! §1 "Script interpretation ... is deliberately out of scope. The core
//! consumes a `VerifyScript(tx, input_index, flags) -> (code, sigchecks)`
//! function.").

use crate::consensus::RuleFlags;
use crate::primitives::Transaction;

/// Result of verifying one input's unlocking script against its
/// prevout's locking script. `sigchecks` is the post-verification
/// signature-check count BCH uses to bound per-tx signature work
/// (`max_tx_sigchecks`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptVerifyResult {
    pub success: bool,
    pub code: i32,
    pub sigchecks: u32,
}

/// The contract callers must supply; the core never interprets scripts
/// itself. A production binary plugs in a real interpreter here.
pub trait VerifyScript: Send + Sync {
    fn verify(&self, tx: &Transaction, input_index: usize, flags: RuleFlags) -> ScriptVerifyResult;
}

/// A verifier that accepts every input with zero sigchecks. Useful for
/// exercising the organizer/mempool pipeline in tests without pulling in
/// a real script interpreter.
pub struct AlwaysAccept;

impl VerifyScript for AlwaysAccept {
    fn verify(&self, _tx: &Transaction, _input_index: usize, _flags: RuleFlags) -> ScriptVerifyResult {
        ScriptVerifyResult { success: true, code: 0, sigchecks: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{OutPoint, Output, TxInput};

    #[test]
    fn always_accept_reports_success() {
        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput { prevout: OutPoint::new([1u8; 32], 0), unlocking_script: vec![], sequence: 0 }],
            outputs: vec![Output { value: 1, script_pubkey: vec![] }],
            lock_time: 0,
        };
        let result = AlwaysAccept.verify(&tx, 0, RuleFlags::all());
        assert!(result.success);
    }
}
