//! Adaptive block-size limit algorithm (ABLA, SPEC_FULL §B).
//!
//! The consensus block-size ceiling moves with an exponential moving
//! average of recent block sizes instead of being a hardcoded constant:
//! blocks that fill most of the current limit push the limit up toward
//! `max_size_factor`, mostly-empty blocks let it decay back toward
//! `min_size`. Grounded on the teacher's `lwma_next_difficulty`
//! weighted-window shape, generalized from difficulty to a size control
//! loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AblaConfig {
    /// Starting block-size ceiling in bytes, at the activation height.
    pub initial_max_block_size: u64,
    /// Absolute floor the ceiling will never shrink below.
    pub min_size: u64,
    /// How many elastic-buffer-widths the ceiling may grow from the
    /// control function's running average per window.
    pub max_size_factor: f64,
    /// Smoothing window, in blocks, for the moving-average control.
    pub window: u64,
}

impl Default for AblaConfig {
    fn default() -> Self {
        Self {
            initial_max_block_size: 32_000_000,
            min_size: 32_000_000,
            max_size_factor: 2.0,
            window: 144,
        }
    }
}

/// Running ABLA state carried forward block-by-block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AblaState {
    pub current_max_block_size: u64,
    /// Exponential moving average of recent block sizes.
    pub ema_block_size: f64,
}

impl AblaState {
    pub fn genesis(config: &AblaConfig) -> Self {
        Self {
            current_max_block_size: config.initial_max_block_size,
            ema_block_size: 0.0,
        }
    }

    /// Fold in the next block's observed size and return the updated
    /// state, including the size ceiling that the block AFTER this one
    /// must respect.
    pub fn advance(&self, config: &AblaConfig, observed_block_size: u64) -> Self {
        let alpha = 2.0 / (config.window as f64 + 1.0);
        let ema = alpha * observed_block_size as f64 + (1.0 - alpha) * self.ema_block_size;

        let utilization = ema / self.current_max_block_size as f64;
        let growth = if utilization > 0.5 {
            1.0 + (utilization - 0.5) * 0.02
        } else {
            1.0 - (0.5 - utilization) * 0.02
        };

        let ceiling = (config.min_size as f64).max(config.max_size_factor * config.initial_max_block_size as f64) as u64;
        let next_max = ((self.current_max_block_size as f64 * growth) as u64)
            .clamp(config.min_size, ceiling);

        Self {
            current_max_block_size: next_max,
            ema_block_size: ema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_blocks_grow_the_ceiling() {
        let config = AblaConfig::default();
        let mut state = AblaState::genesis(&config);
        for _ in 0..300 {
            state = state.advance(&config, config.initial_max_block_size);
        }
        assert!(state.current_max_block_size >= config.initial_max_block_size);
    }

    #[test]
    fn empty_blocks_shrink_the_ceiling_toward_min() {
        let config = AblaConfig::default();
        let mut state = AblaState::genesis(&config);
        state.current_max_block_size = config.max_size_factor as u64 * config.initial_max_block_size;
        for _ in 0..300 {
            state = state.advance(&config, 0);
        }
        assert!(state.current_max_block_size <= config.max_size_factor as u64 * config.initial_max_block_size);
        assert!(state.current_max_block_size >= config.min_size);
    }

    #[test]
    fn ceiling_never_drops_below_min_size() {
        let config = AblaConfig::default();
        let mut state = AblaState::genesis(&config);
        for _ in 0..10_000 {
            state = state.advance(&config, 0);
        }
        assert!(state.current_max_block_size >= config.min_size);
    }
}
