//! `BlockPool`: bidirectional hash↔height index of side-branch tips
//! bounded by a maximum depth below the persistent chain (spec.md §3,
//! §4.2).
//!
//! Grounded on the teacher's `blockchain/chain.rs` `blocks`/`hash_index`
//! `Arc<RwLock<HashMap<...>>>` pair, generalized from "the whole chain"
//! to "the pool of not-yet-attached candidates".

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::chain::branch::Branch;
use crate::hash::Hash32;
use crate::primitives::BlockRef;

struct Entry {
    block: BlockRef,
    parent_hash: Hash32,
    children: HashSet<Hash32>,
}

/// Side-branch candidate pool, keyed by block hash. `maximum_depth`
/// bounds how far below the persistent chain tip entries are retained;
/// `prune` evicts anything older, transitively with descendants.
pub struct BlockPool {
    entries: RwLock<HashMap<Hash32, Entry>>,
    maximum_depth: u64,
}

impl BlockPool {
    pub fn new(maximum_depth: u64) -> Self {
        Self { entries: RwLock::new(HashMap::new()), maximum_depth }
    }

    /// Idempotent on hash. Links the new entry to a pre-existing parent
    /// (if pooled) and adopts any already-pooled children of it.
    pub fn add(&self, block: BlockRef) -> bool {
        let hash = block.hash;
        let parent_hash = block.block.header.prev_hash;
        let mut entries = self.entries.write();
        if entries.contains_key(&hash) {
            return false;
        }
        if let Some(parent) = entries.get_mut(&parent_hash) {
            parent.children.insert(hash);
        }
        let mut children = HashSet::new();
        for (child_hash, child) in entries.iter() {
            if child.parent_hash == hash {
                children.insert(*child_hash);
            }
        }
        entries.insert(hash, Entry { block, parent_hash, children });
        true
    }

    pub fn add_all(&self, blocks: &[BlockRef]) {
        for block in blocks {
            self.add(block.clone());
        }
    }

    pub fn remove(&self, hashes: &[Hash32]) {
        let mut entries = self.entries.write();
        for hash in hashes {
            entries.remove(hash);
        }
    }

    pub fn contains(&self, hash: &Hash32) -> bool {
        self.entries.read().contains_key(hash)
    }

    pub fn get(&self, hash: &Hash32) -> Option<BlockRef> {
        self.entries.read().get(hash).map(|e| e.block.clone())
    }

    /// Evict entries at or below `top_height - maximum_depth`,
    /// transitively removing their descendants (spec.md §9 resolves the
    /// "implicit" BlockPool.prune ambiguity in favor of transitive
    /// removal: a parent's eviction always takes its whole subtree).
    pub fn prune(&self, top_height: u64, height_of: impl Fn(&Hash32) -> Option<u64>) {
        let floor = top_height.saturating_sub(self.maximum_depth);
        let mut entries = self.entries.write();
        let stale: Vec<Hash32> = entries
            .keys()
            .filter(|hash| height_of(hash).map(|h| h <= floor).unwrap_or(false))
            .copied()
            .collect();

        let mut to_remove: HashSet<Hash32> = HashSet::new();
        let mut stack = stale;
        while let Some(hash) = stack.pop() {
            if !to_remove.insert(hash) {
                continue;
            }
            if let Some(entry) = entries.get(&hash) {
                stack.extend(entry.children.iter().copied());
            }
        }
        for hash in to_remove {
            entries.remove(&hash);
        }
    }

    /// Remove pooled hashes from a network inventory list.
    pub fn filter(&self, inventory: &[Hash32]) -> Vec<Hash32> {
        let entries = self.entries.read();
        inventory.iter().filter(|h| !entries.contains_key(*h)).copied().collect()
    }

    /// Walk the parent chain through the pool from `candidate` back to
    /// the first ancestor not present in the pool (the fork parent,
    /// assumed already in the persistent chain). Returns an empty branch
    /// if `candidate` is already pooled.
    pub fn get_path(&self, candidate: &BlockRef, fork_parent_height: impl Fn(&Hash32) -> Option<u64>) -> Branch {
        let entries = self.entries.read();
        if entries.contains_key(&candidate.hash) {
            return Branch::new(0);
        }

        let mut chain = vec![candidate.clone()];
        let mut cursor = candidate.block.header.prev_hash;
        while let Some(entry) = entries.get(&cursor) {
            chain.push(entry.block.clone());
            cursor = entry.block.block.header.prev_hash;
        }
        chain.reverse();

        let height = fork_parent_height(&cursor).unwrap_or(0);
        let mut branch = Branch::new(height);
        for block in chain {
            branch.push_front(block);
        }
        branch
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{make_block_ref, Block};

    fn chain_blocks(n: usize) -> Vec<BlockRef> {
        let mut blocks = vec![make_block_ref(Block::genesis(1, 0x1d00ffff))];
        for i in 1..n {
            let parent = &blocks[i - 1];
            let mut block = Block::genesis(1 + i as u64 * 600, 0x1d00ffff);
            block.header.prev_hash = parent.hash;
            blocks.push(make_block_ref(block));
        }
        blocks
    }

    #[test]
    fn add_is_idempotent_on_hash() {
        let pool = BlockPool::new(10);
        let blocks = chain_blocks(2);
        assert!(pool.add(blocks[1].clone()));
        assert!(!pool.add(blocks[1].clone()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn get_path_walks_back_to_fork_parent() {
        let pool = BlockPool::new(10);
        let blocks = chain_blocks(3);
        pool.add(blocks[1].clone());
        let branch = pool.get_path(&blocks[2], |h| if h == &blocks[0].hash { Some(0) } else { None });
        assert_eq!(branch.blocks.len(), 2);
        assert_eq!(branch.height, 0);
    }

    #[test]
    fn prune_removes_descendants_transitively() {
        let pool = BlockPool::new(1);
        let blocks = chain_blocks(3);
        pool.add(blocks[1].clone());
        pool.add(blocks[2].clone());
        let heights: HashMap<Hash32, u64> = [(blocks[1].hash, 1u64), (blocks[2].hash, 2u64)].into_iter().collect();
        pool.prune(5, |h| heights.get(h).copied());
        assert!(pool.is_empty());
    }
}
