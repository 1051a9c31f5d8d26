//! Consensus rule flags. Bitcoin-inherited soft-fork flags plus the named
//! BCH hard-fork flags gate which checks `validate::transaction` and
//! `validate::block` apply for a given block height/timestamp
//! (SPEC_FULL §2, rule-flags glossary entries).
//!
//! Grounded on the teacher's `Algorithm`-style plain enum usage, recast
//! as a `bitflags`-shaped bitmask since multiple flags are active
//! simultaneously past the early activation heights.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RuleFlags: u64 {
        const BIP16  = 1 << 0;
        const BIP30  = 1 << 1;
        const BIP34  = 1 << 2;
        const BIP65  = 1 << 3;
        const BIP66  = 1 << 4;
        const BIP68  = 1 << 5;
        const BIP90  = 1 << 6;
        const BIP112 = 1 << 7;
        const BIP113 = 1 << 8;

        /// UAHF: the original 2017 chain split, 8x block size bump.
        const UAHF         = 1 << 16;
        /// Difficulty-adjustment cash-window hard fork (DAA-CW144 / LWMA).
        const DAA_CW144     = 1 << 17;
        const PYTHAGORAS    = 1 << 18;
        const EUCLID        = 1 << 19;
        const PISANO        = 1 << 20;
        const MERSENNE      = 1 << 21;
        const FERMAT        = 1 << 22;
        const EULER         = 1 << 23;
        const GAUSS         = 1 << 24;
        const DESCARTES     = 1 << 25;
        const LOBACHEVSKI   = 1 << 26;
        const GALOIS        = 1 << 27;
        const LEIBNIZ       = 1 << 28;
        const CANTOR        = 1 << 29;
        /// aserti3-2d activation; supersedes DAA_CW144's LWMA window.
        const ASERT         = 1 << 30;
        /// Adaptive blocksize limit algorithm activation.
        const ABLA          = 1 << 31;
    }
}

impl Default for RuleFlags {
    fn default() -> Self {
        // Everything through the most recent named fork is active by
        // default; pre-fork behavior is selected explicitly by height.
        Self::all()
    }
}

/// Resolve the flags active at a given median-time-past, per the
/// network's fork activation schedule.
pub fn flags_for_mtp(mtp: u64, schedule: &[(u64, RuleFlags)]) -> RuleFlags {
    let mut flags = RuleFlags::BIP16 | RuleFlags::BIP30 | RuleFlags::BIP34 | RuleFlags::BIP65 | RuleFlags::BIP66;
    for (activation_mtp, flag) in schedule {
        if mtp >= *activation_mtp {
            flags |= *flag;
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_accumulates_flags_in_order() {
        let schedule = [(100u64, RuleFlags::UAHF), (200, RuleFlags::ASERT)];
        let early = flags_for_mtp(50, &schedule);
        assert!(!early.contains(RuleFlags::UAHF));

        let mid = flags_for_mtp(150, &schedule);
        assert!(mid.contains(RuleFlags::UAHF));
        assert!(!mid.contains(RuleFlags::ASERT));

        let late = flags_for_mtp(250, &schedule);
        assert!(late.contains(RuleFlags::UAHF) && late.contains(RuleFlags::ASERT));
    }

    #[test]
    fn base_bips_always_active() {
        let flags = flags_for_mtp(0, &[]);
        assert!(flags.contains(RuleFlags::BIP16 | RuleFlags::BIP30 | RuleFlags::BIP34));
    }
}
