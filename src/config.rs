//! `Settings`: the node-operator-facing configuration surface (spec.md
//! §6.3). Deserializable from the TOML/JSON config file a host binary
//! would load; every field has a sensible default so a bare `{}` still
//! produces a usable configuration.
//!
//! Grounded on the teacher's `pool/src/config.rs` (`#[serde(default)]`
//! per-field with dedicated `default_*` functions, `Deserialize + Clone
//! + Debug` derive set).

use serde::{Deserialize, Serialize};

use crate::consensus::AblaConfig;
use crate::hash::Hash32;
use crate::network::NetworkKind;

fn default_cores() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn default_priority() -> i32 {
    0
}

fn default_byte_fee_satoshis() -> u64 {
    1
}

fn default_sigop_fee_satoshis() -> u64 {
    100
}

fn default_minimum_output_satoshis() -> u64 {
    546
}

fn default_notify_limit_hours() -> u64 {
    24
}

fn default_reorganization_limit() -> u64 {
    10_000
}

fn default_consensus_block_size() -> u64 {
    32_000_000
}

fn default_mempool_max_template_size() -> usize {
    32_000_000
}

fn default_mempool_size_multiplier() -> u32 {
    10
}

fn default_buckets() -> usize {
    4
}

/// Node-operator configuration for the validating core (spec.md §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: NetworkKind,

    /// Worker threads handed to the bucketed fan-out in the populator and
    /// validator (spec.md §5 "bucket-based fan-out").
    #[serde(default = "default_cores")]
    pub cores: usize,

    /// OS-level scheduling priority hint for the organizer threads.
    #[serde(default = "default_priority")]
    pub priority: i32,

    #[serde(default = "default_byte_fee_satoshis")]
    pub byte_fee_satoshis: u64,

    #[serde(default = "default_sigop_fee_satoshis")]
    pub sigop_fee_satoshis: u64,

    #[serde(default = "default_minimum_output_satoshis")]
    pub minimum_output_satoshis: u64,

    /// `FastChain::is_stale_fast` threshold: how far behind wall-clock
    /// the tip can drift before the node reports itself out of sync.
    #[serde(default = "default_notify_limit_hours")]
    pub notify_limit_hours: u64,

    /// Deepest reorganization the organizer will accept without
    /// operator confirmation (spec.md §4.7, `ReorgTooDeep`).
    #[serde(default = "default_reorganization_limit")]
    pub reorganization_limit: u64,

    #[serde(default)]
    pub checkpoints: Vec<(Hash32, u64)>,

    /// When `true`, `checkpoints` are enforced as hard constraints
    /// instead of advisory fast-sync hints.
    #[serde(default)]
    pub fix_checkpoints: bool,

    /// BIP30 unspent-duplicate enforcement toggle (spec.md §9 open
    /// question; see `populate::base::populate_duplicate`).
    #[serde(default)]
    pub allow_collisions: bool,

    #[serde(default)]
    pub easy_blocks: bool,

    #[serde(default = "default_true")]
    pub retarget: bool,

    pub asert_half_life: Option<i64>,

    #[serde(default = "default_consensus_block_size")]
    pub default_consensus_block_size: u64,

    #[serde(default)]
    pub abla_config: AblaConfig,

    #[serde(default = "default_mempool_max_template_size")]
    pub mempool_max_template_size: usize,

    #[serde(default = "default_mempool_size_multiplier")]
    pub mempool_size_multiplier: u32,

    #[serde(default = "default_buckets")]
    pub buckets: usize,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: NetworkKind::Testnet,
            cores: default_cores(),
            priority: default_priority(),
            byte_fee_satoshis: default_byte_fee_satoshis(),
            sigop_fee_satoshis: default_sigop_fee_satoshis(),
            minimum_output_satoshis: default_minimum_output_satoshis(),
            notify_limit_hours: default_notify_limit_hours(),
            reorganization_limit: default_reorganization_limit(),
            checkpoints: Vec::new(),
            fix_checkpoints: false,
            allow_collisions: false,
            easy_blocks: false,
            retarget: true,
            asert_half_life: None,
            default_consensus_block_size: default_consensus_block_size(),
            abla_config: AblaConfig::default(),
            mempool_max_template_size: default_mempool_max_template_size(),
            mempool_size_multiplier: default_mempool_size_multiplier(),
            buckets: default_buckets(),
        }
    }
}

impl Settings {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn mempool_limits(&self) -> crate::mempool::MempoolLimits {
        let mut limits = crate::mempool::MempoolLimits::default();
        limits.max_template_size = self.mempool_max_template_size;
        limits.size_multiplier = self.mempool_size_multiplier;
        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_parse_from_empty_object() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings.network, NetworkKind::Testnet);
        assert!(settings.retarget);
        assert!(settings.cores > 0);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.byte_fee_satoshis, settings.byte_fee_satoshis);
    }
}
