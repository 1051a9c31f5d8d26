//! Difficulty representation and the two adjustment algorithms the chain
//! can run under: the legacy LWMA window (kept as a pre-activation
//! fallback for older checkpoints) and `aserti3-2d`, the exponential
//! moving-target algorithm used from the ASERT activation height onward
//! (SPEC_FULL §B).
//!
//! Grounded on the teacher's `blockchain/consensus.rs` target-math
//! helpers (`target_u64_from_difficulty` and the `BigUint` plumbing in
//! `target_from_difficulty_256`), generalized from a flat u64
//! "difficulty" scalar to a compact 32-bit "bits" target the way real
//! proof-of-work headers carry it.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Target block spacing in seconds.
pub const TARGET_BLOCK_TIME: i64 = 600;

/// ASERT half-life: the span of cumulative timestamp error that doubles
/// or halves the target. Two days, the reference activation parameter.
pub const ASERT_HALF_LIFE: i64 = 2 * 24 * 3600;

/// LWMA window size, retained for pre-activation chains.
pub const LWMA_WINDOW: u64 = 144;
pub const MAX_ADJUSTMENT_UP: f64 = 1.25;
pub const MAX_ADJUSTMENT_DOWN: f64 = 0.75;
pub const MIN_SOLVE_TIME: i64 = TARGET_BLOCK_TIME / 2;
pub const MAX_SOLVE_TIME: i64 = TARGET_BLOCK_TIME * 6;

fn pow_limit() -> BigUint {
    let mut bytes = vec![0xffu8; 32];
    bytes[0] = 0x00;
    bytes[1] = 0x00;
    bytes[2] = 0x00;
    BigUint::from_bytes_be(&bytes)
}

/// Expand a compact "bits" field (Bitcoin's mantissa+exponent packing)
/// into a full 256-bit target.
pub fn bits_to_target(bits: u32) -> BigUint {
    let exponent = bits >> 24;
    let mantissa = bits & 0x007f_ffff;
    if exponent <= 3 {
        BigUint::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigUint::from(mantissa) << (8 * (exponent - 3))
    }
}

/// Compress a full 256-bit target down to the compact "bits" field,
/// clamping to the chain's proof-of-work limit.
pub fn target_to_bits(target: &BigUint) -> u32 {
    let limit = pow_limit();
    let target = if target > &limit { limit } else { target.clone() };
    if target.is_zero() {
        return 0;
    }
    let bytes = target.to_bytes_be();
    let mut size = bytes.len() as u32;
    let padded: Vec<u8> = if bytes.len() >= 3 {
        bytes[..3].to_vec()
    } else {
        let mut p = vec![0u8; 3 - bytes.len()];
        p.extend_from_slice(&bytes);
        p
    };
    let mut mantissa = ((padded[0] as u32) << 16) | ((padded[1] as u32) << 8) | (padded[2] as u32);
    if mantissa & 0x0080_0000 != 0 {
        mantissa >>= 8;
        size += 1;
    }
    (size << 24) | mantissa
}

/// Rough log2-scale difficulty figure for logging/metrics only; never
/// used in consensus comparisons (those operate on raw targets).
pub fn difficulty_from_bits(bits: u32) -> f64 {
    let target = bits_to_target(bits);
    if target.is_zero() {
        return 0.0;
    }
    let limit = pow_limit();
    2f64.powi((limit.bits() as i64 - target.bits() as i64) as i32)
}

/// `aserti3-2d`: compute the next block's target from a fixed anchor
/// block's target, the elapsed wall-clock time since the anchor, and the
/// height of the block being targeted.
///
/// `anchor_bits`/`anchor_height`/`anchor_time` identify a fixed reference
/// block (the activation block in production; the formula is exact, not
/// iterative, so any ancestor works). `height`/`time` describe the block
/// whose target is being computed.
pub fn asert_next_bits(
    anchor_bits: u32,
    anchor_height: u64,
    anchor_time: i64,
    height: u64,
    time: i64,
    half_life: i64,
) -> u32 {
    let anchor_target = bits_to_target(anchor_bits);
    let time_diff = time - anchor_time;
    let height_diff = height as i64 - anchor_height as i64 - 1;
    let exponent_numer = (time_diff - TARGET_BLOCK_TIME * (height_diff + 1)) as i128;
    let half_life = half_life as i128;

    let shifts = exponent_numer.div_euclid(half_life);
    let frac_numer = exponent_numer.rem_euclid(half_life);

    let mut target = anchor_target;
    if shifts >= 0 {
        target <<= shifts as u32;
    } else {
        target >>= (-shifts) as u32;
    }

    // 2^(frac/half_life) via the cubic fixed-point approximation (radix
    // 2^16) used by the reference aserti3-2d implementation. `frac` is
    // bounded by `half_life` so the cubic term alone can reach ~1e20;
    // i128 carries that without overflowing where i64 would.
    let frac = (frac_numer as i128 * 65536) / half_life;
    let factor: i128 = 65536
        + (195_766_423_245_049_i128 * frac) / (1i128 << 48)
        + (971_821_376_i128 * frac * frac) / (1i128 << 48)
        + (2_202_888_i128 * frac * frac * frac) / (1i128 << 48);
    target = (target * BigUint::from(factor.max(1) as u128)) >> 16u32;

    if target.is_zero() {
        target = BigUint::one();
    }
    target_to_bits(&target)
}

/// Timestamp + bits pair used for LWMA input, oldest-first.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub timestamp: i64,
    pub bits: u32,
}

/// Pre-activation fallback: LWMA over the last `LWMA_WINDOW` blocks.
/// `window` must hold at least `LWMA_WINDOW + 1` entries to produce a
/// full estimate; shorter windows degrade to "keep the last target".
pub fn lwma_next_bits(window: &[BlockInfo]) -> u32 {
    let n = LWMA_WINDOW as i64;
    if (window.len() as i64) < n + 1 {
        return window.last().map(|b| b.bits).unwrap_or(0x1d00ffff);
    }
    let start = window.len() - (n as usize + 1);
    let relevant = &window[start..];

    let mut weighted_solvetime_sum: i64 = 0;
    let mut harmonic_target_sum = BigUint::zero();
    let k = n * (n + 1) * TARGET_BLOCK_TIME / 2;

    for i in 1..=(n as usize) {
        let solvetime = (relevant[i].timestamp - relevant[i - 1].timestamp)
            .clamp(MIN_SOLVE_TIME, MAX_SOLVE_TIME * 10);
        weighted_solvetime_sum += solvetime * i as i64;
        let target = bits_to_target(relevant[i].bits);
        harmonic_target_sum += target / BigUint::from(n as u64);
    }

    weighted_solvetime_sum = weighted_solvetime_sum.max(k / 10);
    let next_target =
        (harmonic_target_sum * BigUint::from(weighted_solvetime_sum as u64)) / BigUint::from(k as u64);
    target_to_bits(&next_target)
}
