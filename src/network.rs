//! Network presets: mainnet/testnet/testnet4/regtest/scalenet/chipnet
//! (spec.md §6.3). Each preset fixes the fork-activation schedule, the
//! ASERT/ABLA parameters, and the other per-network knobs that
//! `ChainStatePopulator` and `Settings` read.
//!
//! Grounded on the teacher's `network.rs` (`NetworkType` enum + global
//! `OnceLock`), generalized from 2 variants to 6 and from a flat struct
//! of named constants to a schedule table the populator folds over.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::consensus::{AblaConfig, RuleFlags};

static NETWORK: OnceLock<Network> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Mainnet,
    Testnet,
    Testnet4,
    Regtest,
    Scalenet,
    Chipnet,
}

impl NetworkKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Testnet4 => "testnet4",
            Self::Regtest => "regtest",
            Self::Scalenet => "scalenet",
            Self::Chipnet => "chipnet",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            "testnet4" => Ok(Self::Testnet4),
            "regtest" => Ok(Self::Regtest),
            "scalenet" => Ok(Self::Scalenet),
            "chipnet" => Ok(Self::Chipnet),
            _ => Err(format!("unknown network '{s}'; use mainnet/testnet/testnet4/regtest/scalenet/chipnet")),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A network preset: the full set of per-network knobs
/// `ChainStatePopulator` reads (spec.md §6.3 "Network presets").
#[derive(Debug, Clone)]
pub struct Network {
    pub kind: NetworkKind,
    pub easy_blocks: bool,
    pub retarget: bool,
    asert_half_life: i64,
    default_consensus_block_size: u64,
    abla_config: AblaConfig,
    pub checkpoints: Vec<(crate::hash::Hash32, u64)>,
    asert_activation_mtp: u64,
    asert_anchor_height: u64,
}

impl Network {
    pub fn mainnet() -> Self {
        Self {
            kind: NetworkKind::Mainnet,
            easy_blocks: false,
            retarget: true,
            asert_half_life: 2 * 24 * 3600,
            default_consensus_block_size: 32_000_000,
            abla_config: AblaConfig::default(),
            checkpoints: Vec::new(),
            asert_activation_mtp: 1_605_441_600,
            asert_anchor_height: 661_647,
        }
    }

    pub fn testnet() -> Self {
        Self { kind: NetworkKind::Testnet, easy_blocks: true, retarget: true, ..Self::mainnet() }
    }

    pub fn testnet4() -> Self {
        Self { kind: NetworkKind::Testnet4, easy_blocks: true, retarget: true, ..Self::mainnet() }
    }

    pub fn regtest() -> Self {
        Self {
            kind: NetworkKind::Regtest,
            easy_blocks: true,
            retarget: false,
            asert_activation_mtp: 0,
            asert_anchor_height: 0,
            ..Self::mainnet()
        }
    }

    pub fn scalenet() -> Self {
        let mut abla = AblaConfig::default();
        abla.max_size_factor = 16.0;
        Self {
            kind: NetworkKind::Scalenet,
            easy_blocks: true,
            retarget: true,
            default_consensus_block_size: 256_000_000,
            abla_config: abla,
            ..Self::mainnet()
        }
    }

    pub fn chipnet() -> Self {
        Self { kind: NetworkKind::Chipnet, easy_blocks: true, retarget: true, ..Self::mainnet() }
    }

    pub fn from_kind(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::Mainnet => Self::mainnet(),
            NetworkKind::Testnet => Self::testnet(),
            NetworkKind::Testnet4 => Self::testnet4(),
            NetworkKind::Regtest => Self::regtest(),
            NetworkKind::Scalenet => Self::scalenet(),
            NetworkKind::Chipnet => Self::chipnet(),
        }
    }

    pub fn asert_half_life(&self) -> i64 {
        self.asert_half_life
    }

    pub fn default_consensus_block_size(&self) -> u64 {
        self.default_consensus_block_size
    }

    pub fn abla_config(&self) -> AblaConfig {
        self.abla_config
    }

    pub fn asert_anchor_height(&self) -> u64 {
        self.asert_anchor_height
    }

    /// Fork-activation schedule as `(activation_median_time_past, flag)`
    /// pairs, folded by `consensus::flags::flags_for_mtp`. Regtest
    /// activates everything from genesis so local testing does not need
    /// to mine through every named fork.
    pub fn fork_schedule(&self) -> Vec<(u64, RuleFlags)> {
        if matches!(self.kind, NetworkKind::Regtest) {
            return vec![(0, RuleFlags::all())];
        }
        vec![
            (1_510_185_600, RuleFlags::UAHF),
            (1_513_936_800, RuleFlags::DAA_CW144),
            (1_526_400_000, RuleFlags::PYTHAGORAS),
            (1_542_300_000, RuleFlags::EUCLID),
            (1_557_921_600, RuleFlags::PISANO),
            (1_573_819_200, RuleFlags::MERSENNE),
            (1_589_544_000, RuleFlags::FERMAT),
            (self.asert_activation_mtp, RuleFlags::ASERT),
            (1_621_080_000, RuleFlags::EULER),
            (1_636_977_600, RuleFlags::GAUSS),
            (1_652_788_800, RuleFlags::DESCARTES),
            (1_668_600_000, RuleFlags::LOBACHEVSKI),
            (1_684_411_200, RuleFlags::GALOIS),
            (1_700_222_400, RuleFlags::LEIBNIZ),
            (1_716_033_600, RuleFlags::CANTOR),
            (1_716_033_600, RuleFlags::ABLA),
        ]
    }
}

pub fn set_network(network: Network) {
    NETWORK.set(network).expect("network already set");
}

pub fn get_network() -> &'static Network {
    NETWORK.get_or_init(Network::testnet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_from_str() {
        for kind in [NetworkKind::Mainnet, NetworkKind::Testnet, NetworkKind::Regtest] {
            assert_eq!(NetworkKind::from_str(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn regtest_activates_everything_at_genesis() {
        let schedule = Network::regtest().fork_schedule();
        assert_eq!(schedule, vec![(0, RuleFlags::all())]);
    }

    #[test]
    fn mainnet_schedule_is_monotonic() {
        let schedule = Network::mainnet().fork_schedule();
        let times: Vec<u64> = schedule.iter().map(|(t, _)| *t).collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        assert_eq!(times, sorted);
    }
}
