//! `Branch`: an ordered chain of candidate blocks hanging off a fork
//! point in the persistent chain (spec.md §3, §4.1).
//!
//! Grounded on the teacher's `blockchain/chain.rs` `Chain` struct
//! (height/tip bookkeeping, `try_reorg` depth/finality checks) but
//! reshaped from "the whole chain" into "one side-branch" — the
//! persistent chain itself lives behind `FastChain`.

use num_bigint::BigUint;

use crate::hash::Hash32;
use crate::primitives::BlockRef;

/// Work contributed by a single block's target, `(2^256) / (target + 1)`.
pub fn work_from_target(target: &BigUint) -> BigUint {
    let max = BigUint::from(1u32) << 256u32;
    &max / (target + BigUint::from(1u32))
}

pub fn work_from_bits(bits: u32) -> BigUint {
    work_from_target(&crate::consensus::difficulty::bits_to_target(bits))
}

/// An ordered, low-to-high list of candidate blocks rooted at
/// `height` (the height of the fork-parent block in the persistent
/// chain).
#[derive(Debug, Clone, Default)]
pub struct Branch {
    pub height: u64,
    pub blocks: Vec<BlockRef>,
}

impl Branch {
    pub fn new(height: u64) -> Self {
        Self { height, blocks: Vec::new() }
    }

    /// Append `block` if it properly extends the branch (its `prev_hash`
    /// matches the current front's hash, or the branch is still empty).
    /// Returns `false` without mutating the branch otherwise.
    pub fn push_front(&mut self, block: BlockRef) -> bool {
        let expected_prev = match self.blocks.last() {
            Some(top) => top.hash,
            None => return { self.blocks.push(block); true },
        };
        if block.block.header.prev_hash != expected_prev {
            return false;
        }
        self.blocks.push(block);
        true
    }

    pub fn top(&self) -> Option<&BlockRef> {
        self.blocks.last()
    }

    pub fn top_height(&self) -> u64 {
        self.height + self.blocks.len() as u64
    }

    pub fn fork_point(&self, fork_hash: Hash32) -> (Hash32, u64) {
        (fork_hash, self.height)
    }

    fn index_for_height(&self, height: u64) -> Option<usize> {
        if height <= self.height {
            return None;
        }
        let idx = (height - self.height - 1) as usize;
        if idx < self.blocks.len() {
            Some(idx)
        } else {
            None
        }
    }

    pub fn get_bits(&self, height: u64) -> Option<u32> {
        self.index_for_height(height).map(|i| self.blocks[i].block.header.bits)
    }

    pub fn get_version(&self, height: u64) -> Option<i32> {
        self.index_for_height(height).map(|i| self.blocks[i].block.header.version)
    }

    pub fn get_timestamp(&self, height: u64) -> Option<u64> {
        self.index_for_height(height).map(|i| self.blocks[i].block.header.timestamp)
    }

    pub fn get_block_hash(&self, height: u64) -> Option<Hash32> {
        self.index_for_height(height).map(|i| self.blocks[i].hash)
    }

    /// Search blocks above `outpoint`'s producing height for a spender.
    /// Returns `true` once a later branch block consumes the outpoint.
    pub fn populate_spent(&self, outpoint: &crate::primitives::OutPoint) -> bool {
        self.blocks.iter().any(|block| {
            block.block.transactions.iter().any(|tx| {
                !tx.is_coinbase() && tx.inputs.iter().any(|input| &input.prevout == outpoint)
            })
        })
    }

    /// Search `branch_utxo` (higher blocks override lower ones — callers
    /// build it oldest-first, so scanning in reverse finds the freshest
    /// producer) for a prevout's producing output.
    pub fn populate_prevout<'a>(
        outpoint: &crate::primitives::OutPoint,
        branch_utxo: &'a [std::collections::HashMap<crate::primitives::OutPoint, crate::primitives::Output>],
    ) -> Option<&'a crate::primitives::Output> {
        branch_utxo.iter().rev().find_map(|map| map.get(outpoint))
    }

    pub fn cumulative_work(&self) -> BigUint {
        self.blocks.iter().map(|b| work_from_bits(b.block.header.bits)).fold(BigUint::from(0u32), |a, b| a + b)
    }
}
