//! `TransactionEntry` / `MempoolGraph`: the DAG of unconfirmed
//! transactions with incremental ancestor/descendant fee, size, and
//! sigops aggregates (spec.md §3, §4.8).
//!
//! Grounded on the teacher's `mempool/pool.rs` transaction index shape
//! (`Arc<RwLock<HashMap<...>>>`), generalized from "a flat set of
//! transactions" to a parent/child graph with incremental aggregates —
//! the teacher had no package-feerate concept to carry over here, so
//! this part is built from spec.md §3/§4.8 directly, following the
//! "arena-with-indices, not pointer cycles" guidance in spec.md §9.

use std::collections::{HashMap, HashSet};

use crate::hash::Hash32;
use crate::primitives::TxRef;

/// One mempool DAG node. `marked` backs mark-and-sweep removal (spec.md
/// §9: "mirrors the source's explicit `marked_` flag").
#[derive(Debug, Clone)]
pub struct TransactionEntry {
    pub hash: Hash32,
    pub tx: TxRef,
    pub size: u32,
    pub sigops: u32,
    pub fees: u64,
    pub parents: HashSet<Hash32>,
    pub children: HashSet<Hash32>,
    pub descendant_fees: u64,
    pub descendant_size: u32,
    pub descendant_sigops: u32,
    pub marked: bool,
}

impl TransactionEntry {
    /// Anchor ≡ bound only to chain-confirmed UTXOs (no mempool parents).
    pub fn is_anchor(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn package_feerate(&self) -> f64 {
        let total_fees = self.fees + self.descendant_fees;
        let total_size = self.size + self.descendant_size;
        if total_size == 0 {
            0.0
        } else {
            total_fees as f64 / total_size as f64
        }
    }
}

/// Arena-indexed DAG of `TransactionEntry` nodes, keyed by hash.
#[derive(Default)]
pub struct MempoolGraph {
    nodes: HashMap<Hash32, TransactionEntry>,
}

impl MempoolGraph {
    pub fn new() -> Self {
        Self { nodes: HashMap::new() }
    }

    pub fn contains(&self, hash: &Hash32) -> bool {
        self.nodes.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash32) -> Option<&TransactionEntry> {
        self.nodes.get(hash)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &TransactionEntry> {
        self.nodes.values()
    }

    /// Insert a new leaf node and propagate its fee/size/sigops into
    /// every ancestor's descendant aggregates (spec.md §4.8 step 5,
    /// "propagate `increment_values` through ancestors").
    pub fn insert(&mut self, tx: TxRef, hash: Hash32, fees: u64, sigops: u32, parents: HashSet<Hash32>) {
        let size = tx.size;
        for parent_hash in &parents {
            if let Some(parent) = self.nodes.get_mut(parent_hash) {
                parent.children.insert(hash);
            }
        }
        self.increment_ancestors(&parents, fees, size, sigops);
        self.nodes.insert(
            hash,
            TransactionEntry {
                hash,
                tx,
                size,
                sigops,
                fees,
                parents,
                children: HashSet::new(),
                descendant_fees: 0,
                descendant_size: 0,
                descendant_sigops: 0,
                marked: false,
            },
        );
    }

    fn increment_ancestors(&mut self, start: &HashSet<Hash32>, fees: u64, size: u32, sigops: u32) {
        let mut frontier: Vec<Hash32> = start.iter().copied().collect();
        let mut visited = HashSet::new();
        while let Some(hash) = frontier.pop() {
            if !visited.insert(hash) {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&hash) {
                node.descendant_fees += fees;
                node.descendant_size += size;
                node.descendant_sigops += sigops;
                frontier.extend(node.parents.iter().copied());
            }
        }
    }

    fn decrement_ancestors(&mut self, start: &HashSet<Hash32>, fees: u64, size: u32, sigops: u32) {
        let mut frontier: Vec<Hash32> = start.iter().copied().collect();
        let mut visited = HashSet::new();
        while let Some(hash) = frontier.pop() {
            if !visited.insert(hash) {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&hash) {
                node.descendant_fees = node.descendant_fees.saturating_sub(fees);
                node.descendant_size = node.descendant_size.saturating_sub(size);
                node.descendant_sigops = node.descendant_sigops.saturating_sub(sigops);
                frontier.extend(node.parents.iter().copied());
            }
        }
    }

    /// Remove a node by mark-and-sweep, fixing up every ancestor's
    /// descendant aggregates (spec.md §4.8, "Removal on block
    /// acceptance"). Returns the removed node, if present.
    pub fn remove(&mut self, hash: &Hash32) -> Option<TransactionEntry> {
        let node = self.nodes.remove(hash)?;
        self.decrement_ancestors(&node.parents, node.fees, node.size, node.sigops);
        for parent_hash in &node.parents {
            if let Some(parent) = self.nodes.get_mut(parent_hash) {
                parent.children.remove(hash);
            }
        }
        for child_hash in &node.children {
            if let Some(child) = self.nodes.get_mut(child_hash) {
                child.parents.remove(hash);
            }
        }
        Some(node)
    }

    pub fn remove_all(&mut self, hashes: &[Hash32]) -> Vec<TransactionEntry> {
        hashes.iter().filter_map(|h| self.remove(h)).collect()
    }

    /// Descendant-aggregate invariant used by property tests (spec.md
    /// §8): a node's `descendant_fees` equals its own fees plus the sum
    /// of its distinct-path descendants' fees.
    pub fn descendant_fees_consistent(&self, hash: &Hash32) -> bool {
        let Some(node) = self.nodes.get(hash) else { return true };
        let mut seen = HashSet::new();
        let mut stack: Vec<Hash32> = node.children.iter().copied().collect();
        let mut total = 0u64;
        while let Some(h) = stack.pop() {
            if !seen.insert(h) {
                continue;
            }
            if let Some(child) = self.nodes.get(&h) {
                total += child.fees;
                stack.extend(child.children.iter().copied());
            }
        }
        node.descendant_fees == total
    }
}
