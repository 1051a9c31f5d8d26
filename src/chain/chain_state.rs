//! `ChainState`: immutable projection of the consensus parameters a
//! *next* block must satisfy, and the `ChainStatePopulator` that builds
//! one from `FastChain` plus an optional in-flight `Branch` (spec.md §3,
//! §4.3).

use crate::chain::branch::Branch;
use crate::chain::fast_chain::FastChain;
use crate::consensus::{flags::flags_for_mtp, AblaConfig, AblaState, RuleFlags};
use crate::network::Network;

#[derive(Debug, Clone, Copy)]
pub struct AsertAnchor {
    pub height: u64,
    pub ancestor_time: i64,
    pub target_bits: u32,
}

/// Immutable projection of the rules and deterministic context the
/// *next* block (after `height`) must satisfy. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChainState {
    pub height: u64,
    pub enabled_forks: RuleFlags,
    pub bits_next: u32,
    pub version_next: i32,
    pub median_time_past: u64,
    pub timestamp_sequence: Vec<u64>,
    pub asert_anchor: AsertAnchor,
    pub abla_config: AblaConfig,
    pub abla_state: AblaState,
}

impl ChainState {
    pub fn enabled_forks(&self) -> RuleFlags {
        self.enabled_forks
    }
}

/// Number of timestamps folded into the median-time-past window.
const MTP_WINDOW: u64 = 11;

pub struct ChainStatePopulator<'a> {
    pub chain: &'a dyn FastChain,
    pub network: &'a Network,
}

impl<'a> ChainStatePopulator<'a> {
    pub fn new(chain: &'a dyn FastChain, network: &'a Network) -> Self {
        Self { chain, network }
    }

    /// Project the `ChainState` for the block that would follow `branch`
    /// (or the persistent tip, if `branch` is `None`). Returns `None` if
    /// a header required for the projection is missing from storage —
    /// the caller surfaces that as a storage fault, never a validation
    /// failure (spec.md §4.3 contract).
    pub fn populate(&self, branch: Option<&Branch>) -> Option<ChainState> {
        let top_height = branch.map(|b| b.top_height()).unwrap_or_else(|| self.chain.get_last_height());
        let next_height = top_height + 1;

        let bits_at = |h: u64| -> Option<u32> {
            branch.and_then(|b| b.get_bits(h)).or_else(|| self.chain.get_bits(h))
        };
        let timestamp_at = |h: u64| -> Option<u64> {
            branch.and_then(|b| b.get_timestamp(h)).or_else(|| self.chain.get_timestamp(h))
        };

        let top_bits = bits_at(top_height)?;
        let top_time = timestamp_at(top_height)?;

        let mut timestamp_sequence = Vec::new();
        for i in 0..MTP_WINDOW {
            if top_height < i {
                break;
            }
            match timestamp_at(top_height - i) {
                Some(ts) => timestamp_sequence.push(ts),
                None => return None,
            }
        }
        let mut sorted = timestamp_sequence.clone();
        sorted.sort_unstable();
        let median_time_past = sorted.get(sorted.len() / 2).copied().unwrap_or(top_time);

        let schedule = self.network.fork_schedule();
        let enabled_forks = flags_for_mtp(median_time_past, &schedule);
        let forks_at_top = flags_for_mtp(top_time, &schedule);
        if enabled_forks != forks_at_top {
            log::info!(
                "fork activation at height {next_height}: {:?} -> {:?}",
                forks_at_top,
                enabled_forks
            );
        }

        let anchor = self.network.asert_anchor_height();
        let anchor_bits = bits_at(anchor).unwrap_or(top_bits);
        let anchor_time = timestamp_at(anchor).map(|t| t as i64).unwrap_or(top_time as i64);

        let bits_next = if enabled_forks.contains(RuleFlags::ASERT) {
            crate::consensus::difficulty::asert_next_bits(
                anchor_bits,
                anchor,
                anchor_time,
                next_height,
                top_time as i64 + crate::consensus::difficulty::TARGET_BLOCK_TIME,
                self.network.asert_half_life(),
            )
        } else {
            top_bits
        };

        let abla_state = self
            .chain
            .get_header_and_abla_state(top_height)
            .map(|e| e.abla_state)
            .unwrap_or_else(|| AblaState::genesis(&self.network.abla_config()));

        Some(ChainState {
            height: next_height,
            enabled_forks,
            bits_next,
            version_next: 0x2000_0000,
            median_time_past,
            timestamp_sequence,
            asert_anchor: AsertAnchor { height: anchor, ancestor_time: anchor_time, target_bits: anchor_bits },
            abla_config: self.network.abla_config(),
            abla_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::fast_chain::InMemoryFastChain;
    use crate::primitives::{make_block_ref, Block};

    #[test]
    fn populate_fails_gracefully_on_missing_headers() {
        let genesis = make_block_ref(Block::genesis(1, 0x1d00ffff));
        let chain = InMemoryFastChain::new(genesis, AblaState::genesis(&AblaConfig::default()));
        let network = Network::regtest();
        let populator = ChainStatePopulator::new(&chain, &network);
        assert!(populator.populate(None).is_some());
    }

    #[test]
    fn next_height_follows_tip() {
        let genesis = make_block_ref(Block::genesis(1, 0x1d00ffff));
        let chain = InMemoryFastChain::new(genesis, AblaState::genesis(&AblaConfig::default()));
        let network = Network::regtest();
        let populator = ChainStatePopulator::new(&chain, &network);
        let state = populator.populate(None).unwrap();
        assert_eq!(state.height, 1);
    }
}
