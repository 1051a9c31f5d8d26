//! `PopulateBlock`: attach prevout metadata to every non-coinbase
//! transaction in a branch's top block, fanned out across input buckets
//! (spec.md §4.4 "PopulateBlock.populate").

use std::collections::HashMap;

use crate::chain::branch::Branch;
use crate::chain::fast_chain::FastChain;
use crate::mempool::pool::Mempool;
use crate::populate::base::{populate_prevout, SendPtr, TxValidationContext};
use crate::primitives::{OutPoint, Output};

/// Per-transaction validation contexts for every tx in the branch's top
/// block, in transaction order (index 0 is always the coinbase).
pub struct BlockValidationContext {
    pub tx_contexts: Vec<TxValidationContext>,
    pub prevout_cache_hits: u64,
    pub prevout_cache_misses: u64,
}

pub struct PopulateBlock<'a> {
    pub chain: &'a dyn FastChain,
    pub mempool: Option<&'a Mempool>,
    pub buckets: usize,
}

impl<'a> PopulateBlock<'a> {
    /// Build the vector of per-block UTXO maps for every block already
    /// in `branch` below its top, oldest first (spec.md §3 "branch_utxo
    /// ... one entry per block already in the branch").
    fn branch_utxo(branch: &Branch) -> Vec<HashMap<OutPoint, Output>> {
        let mut maps = Vec::new();
        let lower = &branch.blocks[..branch.blocks.len().saturating_sub(1)];
        for block in lower {
            let mut map = HashMap::new();
            for tx in &block.block.transactions {
                let txid = tx.calculate_hash();
                for (i, output) in tx.outputs.iter().enumerate() {
                    map.insert(OutPoint::new(txid, i as u32), output.clone());
                }
            }
            maps.push(map);
        }
        maps
    }

    /// The *reorg subset*: outputs produced by blocks being undone by a
    /// reorganization, fetched once per populate pass from storage.
    fn reorg_subset(&self, fork_height: u64, persistent_tip: u64) -> HashMap<OutPoint, Output> {
        if persistent_tip <= fork_height {
            return HashMap::new();
        }
        self.chain.get_utxo_pool_from(fork_height + 1, persistent_tip)
    }

    pub fn populate(&self, branch: &Branch) -> BlockValidationContext {
        let Some(top_block) = branch.top() else {
            return BlockValidationContext { tx_contexts: Vec::new(), prevout_cache_hits: 0, prevout_cache_misses: 0 };
        };

        let branch_height = branch.top_height() - 1;
        let branch_utxo = Self::branch_utxo(branch);
        let persistent_tip = self.chain.get_last_height();
        let reorg_subset = self.reorg_subset(branch.height, persistent_tip);

        let mut hits = 0u64;
        let mut misses = 0u64;
        let mut tx_contexts = Vec::with_capacity(top_block.block.transactions.len());

        for (tx_index, tx) in top_block.block.transactions.iter().enumerate() {
            if tx_index == 0 {
                // Coinbase: no prevouts to populate.
                tx_contexts.push(TxValidationContext::with_inputs(0));
                continue;
            }
            let mut ctx = TxValidationContext::with_inputs(tx.inputs.len());
            let buckets = self.buckets.max(1);
            std::thread::scope(|scope| {
                let prevouts_ptr = SendPtr(ctx.prevouts.as_mut_ptr());
                let len = ctx.prevouts.len();
                let inputs = &tx.inputs;
                let branch_utxo = &branch_utxo;
                let reorg_subset = &reorg_subset;
                for bucket in 0..buckets {
                    scope.spawn(move || {
                        let prevouts_ptr: SendPtr<_> = prevouts_ptr;
                        let prevouts_ptr = prevouts_ptr.0;
                        let mut idx = bucket;
                        while idx < len {
                            let slot = unsafe { &mut *prevouts_ptr.add(idx) };
                            let outpoint = &inputs[idx].prevout;
                            populate_prevout(slot, outpoint, branch_height, self.chain, branch_utxo);
                            if slot.cache.is_none() {
                                if let Some(output) = reorg_subset.get(outpoint) {
                                    slot.cache = Some(output.clone());
                                    slot.confirmed = true;
                                }
                            }
                            if slot.cache.is_none() {
                                if let Some(mempool) = self.mempool {
                                    if let Some(output) = mempool.get_utxo(outpoint) {
                                        slot.cache = Some(output);
                                        slot.from_mempool = true;
                                    }
                                }
                            }
                            idx += buckets;
                        }
                    });
                }
            });
            for prevout in &ctx.prevouts {
                if prevout.cache.is_some() {
                    hits += 1;
                } else {
                    misses += 1;
                }
            }
            tx_contexts.push(ctx);
        }

        log::debug!("populated branch top at height {}: {hits} cache hits, {misses} misses", branch.top_height());
        BlockValidationContext { tx_contexts, prevout_cache_hits: hits, prevout_cache_misses: misses }
    }
}
