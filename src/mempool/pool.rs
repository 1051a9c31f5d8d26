//! `Mempool`: admission, eviction, ordering, UTXO-of-mempool, and
//! template assembly over the `MempoolGraph` (spec.md §4.8).
//!
//! Grounded on the teacher's `mempool/pool.rs` (`Mempool` struct shape,
//! `Arc<RwLock<...>>` fields, `MAX_MEMPOOL_SIZE`/`MAX_MEMPOOL_BYTES`
//! limits) and `mempool/eviction.rs` (worst-entry-first eviction),
//! generalized from a flat transaction set to the package-feerate
//! ordering spec.md §4.8 requires.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::hash::Hash32;
use crate::mempool::entry::MempoolGraph;
use crate::primitives::{OutPoint, Output, TxRef};

/// Mempool capacity and template-assembly limits (spec.md §6.3
/// "Mempool: `mempool_max_template_size`, `mempool_size_multiplier`").
#[derive(Debug, Clone, Copy)]
pub struct MempoolLimits {
    pub max_size: usize,
    pub max_bytes: usize,
    pub max_template_size: usize,
    pub size_multiplier: u32,
}

impl Default for MempoolLimits {
    fn default() -> Self {
        Self {
            max_size: 50_000,
            max_bytes: 300_000_000,
            max_template_size: 32_000_000,
            size_multiplier: 10,
        }
    }
}

struct Inner {
    graph: MempoolGraph,
    utxo: HashMap<OutPoint, Output>,
    spent_by: HashMap<OutPoint, Hash32>,
    total_bytes: usize,
}

pub struct Mempool {
    inner: RwLock<Inner>,
    limits: MempoolLimits,
}

impl Mempool {
    pub fn new(limits: MempoolLimits) -> Self {
        Self {
            inner: RwLock::new(Inner {
                graph: MempoolGraph::new(),
                utxo: HashMap::new(),
                spent_by: HashMap::new(),
                total_bytes: 0,
            }),
            limits,
        }
    }

    pub fn size(&self) -> usize {
        self.inner.read().graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains(&self, hash: &Hash32) -> bool {
        self.inner.read().graph.contains(hash)
    }

    pub fn get_utxo(&self, outpoint: &OutPoint) -> Option<Output> {
        self.inner.read().utxo.get(outpoint).cloned()
    }

    /// Admit `tx` with `fees`/`sigops` precomputed by the validator
    /// (spec.md §4.8 step "Admission (`add`)").
    pub fn add(&self, tx: TxRef, fees: u64, sigops: u32, chain_has_output: impl Fn(&OutPoint) -> bool) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let hash = tx.hash;

        if inner.graph.contains(&hash) {
            return Err(CoreError::DuplicatedTransaction);
        }

        let mut parents = HashSet::new();
        for input in &tx.tx.inputs {
            if input.prevout.is_null() {
                continue;
            }
            if let Some(spender) = inner.spent_by.get(&input.prevout) {
                if *spender == hash {
                    continue;
                }
                return if inner.utxo.contains_key(&input.prevout) {
                    Err(CoreError::DoubleSpendMempool(input.prevout.to_string()))
                } else {
                    Err(CoreError::DoubleSpendBlockchain(input.prevout.to_string()))
                };
            }
            if inner.graph.contains(&input.prevout.txid) {
                parents.insert(input.prevout.txid);
            } else if !inner.utxo.contains_key(&input.prevout) && !chain_has_output(&input.prevout) {
                return Err(CoreError::MissingPreviousOutput(
                    input.prevout.txid.iter().map(|b| format!("{b:02x}")).collect(),
                    input.prevout.index,
                ));
            }
        }

        if inner.graph.len() >= self.limits.max_size || inner.total_bytes + tx.size as usize > self.limits.max_bytes {
            let candidate_feerate = fees as f64 / tx.size.max(1) as f64;
            let worst = inner
                .graph
                .values()
                .min_by(|a, b| a.package_feerate().partial_cmp(&b.package_feerate()).unwrap())
                .map(|e| (e.hash, e.package_feerate(), e.size));
            match worst {
                Some((worst_hash, worst_feerate, worst_size)) if candidate_feerate > worst_feerate => {
                    log::debug!("evicting {} (feerate {worst_feerate:.2}) for incoming tx at {candidate_feerate:.2}", crate::hash::hash_to_hex(&worst_hash));
                    Self::evict_locked(&mut inner, &worst_hash);
                    let _ = worst_size;
                }
                _ => return Err(CoreError::LowBenefitTransaction),
            }
        }

        for input in &tx.tx.inputs {
            if !input.prevout.is_null() {
                inner.spent_by.insert(input.prevout, hash);
                inner.utxo.remove(&input.prevout);
            }
        }
        let txid = tx.hash;
        for (i, output) in tx.tx.outputs.iter().enumerate() {
            inner.utxo.insert(OutPoint::new(txid, i as u32), output.clone());
        }
        inner.total_bytes += tx.size as usize;
        inner.graph.insert(tx, hash, fees, sigops, parents);
        Ok(())
    }

    fn evict_locked(inner: &mut Inner, hash: &Hash32) {
        if let Some(node) = inner.graph.remove(hash) {
            inner.total_bytes = inner.total_bytes.saturating_sub(node.size as usize);
            for (i, _) in node.tx.tx.outputs.iter().enumerate() {
                inner.utxo.remove(&OutPoint::new(node.hash, i as u32));
            }
            for input in &node.tx.tx.inputs {
                if inner.spent_by.get(&input.prevout) == Some(&node.hash) {
                    inner.spent_by.remove(&input.prevout);
                }
            }
        }
    }

    /// Remove transactions that a newly-accepted block confirmed,
    /// fixing up descendant aggregates (spec.md §4.8 "Removal on block
    /// acceptance").
    pub fn remove_confirmed(&self, hashes: &[Hash32]) {
        let mut inner = self.inner.write();
        for hash in hashes {
            Self::evict_locked(&mut inner, hash);
        }
    }

    /// Re-admit transactions displaced by a reorganization, dropping any
    /// that no longer validate against the new tip (spec.md §4.8
    /// "Removal on reorganization").
    pub fn reinstate(&self, txs: Vec<(TxRef, u64, u32)>, chain_has_output: impl Fn(&OutPoint) -> bool) {
        for (tx, fees, sigops) in txs {
            let _ = self.add(tx, fees, sigops, &chain_has_output);
        }
    }

    pub fn snapshot(&self, maximum: usize) -> Vec<TxRef> {
        self.inner.read().graph.values().take(maximum).map(|e| e.tx.clone()).collect()
    }

    /// Best-feerate-first template assembly: include a node only once
    /// all its mempool ancestors are already included (spec.md §4.8
    /// "Template generation").
    pub fn build_template(&self, max_size: usize, max_sigops: u32) -> Vec<TxRef> {
        let inner = self.inner.read();
        let mut candidates: Vec<&crate::mempool::entry::TransactionEntry> = inner.graph.values().collect();
        candidates.sort_by(|a, b| {
            b.package_feerate()
                .partial_cmp(&a.package_feerate())
                .unwrap()
                .then_with(|| a.hash.cmp(&b.hash))
        });

        let mut included = HashSet::new();
        let mut total_size = 0usize;
        let mut total_sigops = 0u32;
        let mut ordered = Vec::new();

        for entry in candidates {
            if !entry.parents.iter().all(|p| included.contains(p)) {
                continue;
            }
            if total_size + entry.size as usize > max_size || total_sigops + entry.sigops > max_sigops {
                continue;
            }
            total_size += entry.size as usize;
            total_sigops += entry.sigops;
            included.insert(entry.hash);
            ordered.push(entry.tx.clone());
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{make_tx_ref, OutPoint, Output, Transaction, TxInput};

    fn tx_spending(prev: Hash32, value: u64) -> TxRef {
        make_tx_ref(Transaction {
            version: 2,
            inputs: vec![TxInput { prevout: OutPoint::new(prev, 0), unlocking_script: vec![], sequence: 0 }],
            outputs: vec![Output { value, script_pubkey: vec![] }],
            lock_time: 0,
        })
    }

    #[test]
    fn duplicate_admission_is_rejected() {
        let pool = Mempool::new(MempoolLimits::default());
        let tx = tx_spending([1u8; 32], 1000);
        pool.add(tx.clone(), 100, 1, |_| true).unwrap();
        assert_eq!(pool.add(tx, 100, 1, |_| true), Err(CoreError::DuplicatedTransaction));
    }

    #[test]
    fn double_spend_in_mempool_is_rejected() {
        let pool = Mempool::new(MempoolLimits::default());
        let outpoint_source = [7u8; 32];
        let t1 = tx_spending(outpoint_source, 1000);
        let t2 = {
            let mut tx = t1.tx.clone();
            tx.lock_time = 99;
            make_tx_ref(tx)
        };
        pool.add(t1, 100, 1, |_| true).unwrap();
        let err = pool.add(t2, 100, 1, |_| true).unwrap_err();
        assert!(matches!(err, CoreError::DoubleSpendMempool(_) | CoreError::DoubleSpendBlockchain(_)));
    }

    #[test]
    fn missing_prevout_is_rejected() {
        let pool = Mempool::new(MempoolLimits::default());
        let tx = tx_spending([2u8; 32], 1000);
        assert!(pool.add(tx, 100, 1, |_| false).is_err());
    }

    #[test]
    fn confirmed_removal_clears_entry() {
        let pool = Mempool::new(MempoolLimits::default());
        let tx = tx_spending([3u8; 32], 1000);
        let hash = tx.hash;
        pool.add(tx, 100, 1, |_| true).unwrap();
        assert_eq!(pool.size(), 1);
        pool.remove_confirmed(&[hash]);
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn template_respects_size_budget() {
        let pool = Mempool::new(MempoolLimits::default());
        let tx = tx_spending([4u8; 32], 1000);
        pool.add(tx.clone(), 500, 1, |_| true).unwrap();
        let template = pool.build_template(0, 100);
        assert!(template.is_empty());
        let template = pool.build_template(10_000, 100);
        assert_eq!(template.len(), 1);
    }
}
