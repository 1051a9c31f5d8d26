//! `ValidateTransaction`: the `check → accept → connect` pipeline for a
//! single transaction (spec.md §4.5).

use crate::consensus::{fee as fee_policy, RuleFlags};
use crate::error::{CoreError, CoreResult};
use crate::populate::base::TxValidationContext;
use crate::primitives::TxRef;
use crate::validate::script::VerifyScript;

/// Maximum sigchecks a single transaction may accumulate across all its
/// inputs (spec.md glossary, "Sigchecks").
pub const MAX_TX_SIGCHECKS: u32 = 3_000;

/// Rough per-byte sigop upper bound used by `check` before script
/// verification has actually run (spec.md §4.5, "sigop upper bound
/// using canonical serialization size").
const SIGOPS_PER_BYTE_UPPER_BOUND: f64 = 1.0 / 50.0;

pub struct ValidateTransaction;

impl ValidateTransaction {
    /// Context-free checks: syntax, ranges, coinbase shape, sigop upper
    /// bound. `retarget` lets regtest relax timing-sensitive rules;
    /// transactions carry none, so it is accepted for symmetry with
    /// `ValidateBlock::check` but unused here.
    pub fn check(tx: &TxRef, _retarget: bool) -> CoreResult<()> {
        if tx.tx.inputs.is_empty() {
            return Err(CoreError::TxCheckFailed("transaction has no inputs".into()));
        }
        if tx.tx.outputs.is_empty() {
            return Err(CoreError::TxCheckFailed("transaction has no outputs".into()));
        }
        if tx.tx.is_coinbase() && tx.tx.inputs.len() != 1 {
            return Err(CoreError::TxCheckFailed("coinbase must have exactly one input".into()));
        }
        if !tx.tx.is_coinbase() && tx.tx.inputs.iter().any(|i| i.is_coinbase()) {
            return Err(CoreError::TxCheckFailed("null prevout outside coinbase position".into()));
        }
        for output in &tx.tx.outputs {
            if output.value > 21_000_000 * 100_000_000 {
                return Err(CoreError::TxCheckFailed("output value exceeds money supply".into()));
            }
        }
        let upper_bound_sigops = (tx.size as f64 * SIGOPS_PER_BYTE_UPPER_BOUND) as u32;
        if upper_bound_sigops > MAX_TX_SIGCHECKS * 4 {
            return Err(CoreError::TxCheckFailed("transaction exceeds sigop upper bound by size".into()));
        }
        Ok(())
    }

    /// Contextual rule checks: lock-time vs MTP/height, prevout
    /// presence, fee non-negativity, policy minima. Requires `ctx` to
    /// already carry a populated `state` and `prevouts` (i.e. the
    /// populator has already run).
    pub fn accept(tx: &TxRef, ctx: &TxValidationContext) -> CoreResult<u64> {
        let state = ctx.state.as_ref().ok_or(CoreError::ChainStateUnavailable)?;

        if !tx.tx.is_final(state.height, state.median_time_past) {
            return Err(CoreError::TxAcceptFailed("transaction is not final at this height/MTP".into()));
        }

        let mut total_in: u64 = 0;
        for (i, prevout) in ctx.prevouts.iter().enumerate() {
            if tx.tx.inputs[i].is_coinbase() {
                continue;
            }
            let Some(output) = &prevout.cache else {
                return Err(CoreError::MissingPreviousOutput(tx.hash.iter().map(|b| format!("{b:02x}")).collect(), i as u32));
            };
            if prevout.spent {
                return Err(CoreError::DoubleSpendBlockchain(format!("input {i}")));
            }
            if prevout.coinbase && prevout.confirmed {
                let maturity = crate::consensus::reward::COINBASE_MATURITY;
                if state.height.saturating_sub(prevout.height) < maturity {
                    return Err(CoreError::TxAcceptFailed(format!("input {i} spends immature coinbase")));
                }
            }
            total_in += output.value;
        }

        let total_out: u64 = tx.tx.outputs.iter().map(|o| o.value).sum();
        if !tx.tx.is_coinbase() && total_out > total_in {
            return Err(CoreError::TxAcceptFailed("outputs exceed inputs".into()));
        }
        let fee = if tx.tx.is_coinbase() { 0 } else { total_in - total_out };

        if !tx.tx.is_coinbase() {
            fee_policy::validate_fee(fee, tx.size as usize).map_err(CoreError::TxAcceptFailed)?;
            fee_policy::validate_output_amounts(&tx.tx).map_err(CoreError::TxAcceptFailed)?;
        }

        Ok(fee)
    }

    /// Fan out script verification across input buckets; sum sigchecks
    /// and enforce `MAX_TX_SIGCHECKS`. First failing input short-
    /// circuits the whole transaction (spec.md §4.5 "First non-success
    /// short-circuits the bucket").
    pub fn connect(tx: &TxRef, flags: RuleFlags, verifier: &dyn VerifyScript, buckets: usize) -> CoreResult<u32> {
        if tx.tx.is_coinbase() {
            return Ok(0);
        }
        let buckets = buckets.max(1);
        let failure: std::sync::Mutex<Option<(usize, i32)>> = std::sync::Mutex::new(None);
        let sigchecks = std::sync::atomic::AtomicU32::new(0);

        std::thread::scope(|scope| {
            let failure = &failure;
            let sigchecks = &sigchecks;
            for bucket in 0..buckets {
                scope.spawn(move || {
                    let mut idx = bucket;
                    while idx < tx.tx.inputs.len() {
                        if failure.lock().unwrap().is_some() {
                            return;
                        }
                        let result = verifier.verify(&tx.tx, idx, flags);
                        if !result.success {
                            let mut guard = failure.lock().unwrap();
                            if guard.is_none() {
                                *guard = Some((idx, result.code));
                            }
                            return;
                        }
                        sigchecks.fetch_add(result.sigchecks, std::sync::atomic::Ordering::Relaxed);
                        idx += buckets;
                    }
                });
            }
        });

        if let Some((idx, code)) = *failure.lock().unwrap() {
            return Err(CoreError::ScriptVerifyFailed(idx as u32, code));
        }
        let total = sigchecks.load(std::sync::atomic::Ordering::Relaxed);
        if total > MAX_TX_SIGCHECKS {
            return Err(CoreError::TransactionSigchecksLimit(
                tx.hash.iter().map(|b| format!("{b:02x}")).collect(),
                total,
                MAX_TX_SIGCHECKS,
            ));
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{make_tx_ref, OutPoint, Output, Transaction, TxInput};
    use crate::validate::script::AlwaysAccept;

    fn sample_tx() -> TxRef {
        make_tx_ref(Transaction {
            version: 2,
            inputs: vec![TxInput { prevout: OutPoint::new([1u8; 32], 0), unlocking_script: vec![], sequence: 0xffffffff }],
            outputs: vec![Output { value: 900, script_pubkey: vec![] }],
            lock_time: 0,
        })
    }

    #[test]
    fn check_rejects_coinbase_style_input_outside_coinbase() {
        let mut tx = sample_tx().tx.clone();
        tx.inputs[0].prevout = OutPoint::coinbase();
        let tx_ref = make_tx_ref(tx);
        assert!(ValidateTransaction::check(&tx_ref, false).is_err());
    }

    #[test]
    fn check_accepts_well_formed_tx() {
        assert!(ValidateTransaction::check(&sample_tx(), false).is_ok());
    }

    #[test]
    fn connect_sums_sigchecks_with_always_accept() {
        let tx = sample_tx();
        let sigchecks = ValidateTransaction::connect(&tx, RuleFlags::all(), &AlwaysAccept, 2).unwrap();
        assert_eq!(sigchecks, 1);
    }
}
