//! Coinbase subsidy schedule.
//!
//! Grounded on the teacher's `blockchain/reward.rs`, which computed a
//! flat non-halving ZION emission; replaced with a standard geometric
//! halving schedule since the BCH emission curve halves the subsidy
//! every fixed interval until it floors at zero.

/// Initial subsidy, in satoshis, paid to the first halving epoch.
pub const INITIAL_SUBSIDY_SATS: u64 = 50_0000_0000;

/// Blocks between halvings.
pub const HALVING_INTERVAL: u64 = 210_000;

/// Number of times the subsidy can halve before the integer division
/// result reaches zero and stays there permanently.
const MAX_HALVINGS: u64 = 64;

/// Subsidy for a coinbase transaction at the given height.
pub fn subsidy_at_height(height: u64) -> u64 {
    let halvings = height / HALVING_INTERVAL;
    if halvings >= MAX_HALVINGS {
        return 0;
    }
    INITIAL_SUBSIDY_SATS >> halvings
}

/// Maximum legal coinbase output value: subsidy plus the fees collected
/// from the block's other transactions.
pub fn max_coinbase_value(height: u64, fees: u64) -> u64 {
    subsidy_at_height(height).saturating_add(fees)
}

/// Height at which a coinbase output becomes spendable (SPEC_FULL §B).
pub const COINBASE_MATURITY: u64 = 100;
