//! Minimum-fee policy for mempool admission and block assembly.
//!
//! Grounded on the teacher's `blockchain/fee.rs`
//! (`estimate_tx_size`/`fee_rate`/`minimum_fee_for_size`/
//! `validate_output_amounts`), carried over with the BCH-shaped limits
//! from SPEC_FULL §B (dust threshold replaces the teacher's flat
//! per-tx minimum).

use crate::primitives::Transaction;

/// Minimum relay fee rate, satoshis per byte.
pub const MIN_FEE_RATE: u64 = 1;

/// Maximum standard transaction size policy enforces against, in bytes.
pub const MAX_STANDARD_TX_SIZE: usize = 100_000;

/// Outputs below this value are considered dust and rejected by policy
/// (not consensus) checks.
pub const DUST_THRESHOLD: u64 = 546;

pub fn estimate_tx_size(tx: &Transaction) -> usize {
    tx.serialize().len()
}

pub fn fee_rate(fee: u64, size: usize) -> f64 {
    if size == 0 {
        return 0.0;
    }
    fee as f64 / size as f64
}

pub fn minimum_fee_for_size(size: usize) -> u64 {
    (size as u64) * MIN_FEE_RATE
}

pub fn validate_fee(fee: u64, size: usize) -> Result<(), String> {
    if size > MAX_STANDARD_TX_SIZE {
        return Err(format!("transaction size {size} exceeds standard limit {MAX_STANDARD_TX_SIZE}"));
    }
    let minimum = minimum_fee_for_size(size);
    if fee < minimum {
        return Err(format!("fee {fee} below minimum {minimum} for size {size}"));
    }
    Ok(())
}

pub fn validate_output_amounts(tx: &Transaction) -> Result<(), String> {
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value < DUST_THRESHOLD {
            return Err(format!("output {i} value {} below dust threshold {DUST_THRESHOLD}", output.value));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{OutPoint, Output, TxInput};

    fn sample_tx(output_value: u64) -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![TxInput { prevout: OutPoint::new([1u8; 32], 0), unlocking_script: vec![], sequence: 0 }],
            outputs: vec![Output { value: output_value, script_pubkey: vec![] }],
            lock_time: 0,
        }
    }

    #[test]
    fn fee_below_minimum_is_rejected() {
        let tx = sample_tx(10_000);
        let size = estimate_tx_size(&tx);
        assert!(validate_fee(0, size).is_err());
        assert!(validate_fee(minimum_fee_for_size(size), size).is_ok());
    }

    #[test]
    fn dust_output_is_rejected() {
        let tx = sample_tx(100);
        assert!(validate_output_amounts(&tx).is_err());
        let tx = sample_tx(DUST_THRESHOLD);
        assert!(validate_output_amounts(&tx).is_ok());
    }

    #[test]
    fn oversized_tx_is_rejected() {
        let err = validate_fee(1_000_000, MAX_STANDARD_TX_SIZE + 1).unwrap_err();
        assert!(err.contains("exceeds standard limit"));
    }
}
