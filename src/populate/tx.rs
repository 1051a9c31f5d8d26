//! `PopulateTx`: attach prevout/duplicate metadata to a loose
//! transaction ahead of `ValidateTransaction::accept` (spec.md §4.4
//! "PopulateTx.populate").

use std::collections::HashMap;

use crate::chain::chain_state::ChainState;
use crate::chain::fast_chain::FastChain;
use crate::mempool::pool::Mempool;
use crate::populate::base::{populate_duplicate, populate_prevout, SendPtr, TxValidationContext};
use crate::primitives::TxRef;

pub struct PopulateTx<'a> {
    pub chain: &'a dyn FastChain,
    pub mempool: Option<&'a Mempool>,
    pub allow_collisions: bool,
    pub buckets: usize,
}

impl<'a> PopulateTx<'a> {
    pub fn populate(&self, tx: &TxRef, state: &ChainState) -> TxValidationContext {
        let mut ctx = TxValidationContext::with_inputs(tx.tx.inputs.len());
        ctx.state = Some(state.clone());

        let branch_height = state.height.saturating_sub(1);
        ctx.duplicate = populate_duplicate(branch_height, &tx.hash, self.allow_collisions);
        if ctx.duplicate {
            return ctx;
        }

        let empty_branch_utxo: [HashMap<crate::primitives::OutPoint, crate::primitives::Output>; 0] = [];
        let buckets = self.buckets.max(1);
        std::thread::scope(|scope| {
            // Bucketed fan-out over input indices: bucket b handles
            // indices b, b+buckets, b+2*buckets, ... (spec.md §4.4).
            let inputs = &tx.tx.inputs;
            let prevouts_ptr = SendPtr(ctx.prevouts.as_mut_ptr());
            let len = ctx.prevouts.len();
            let empty_branch_utxo = &empty_branch_utxo;
            for bucket in 0..buckets {
                let inputs = inputs;
                scope.spawn(move || {
                    let prevouts_ptr: SendPtr<_> = prevouts_ptr;
                    let prevouts_ptr = prevouts_ptr.0;
                    let mut idx = bucket;
                    while idx < len {
                        // SAFETY: each bucket owns a disjoint set of
                        // indices (stride == buckets), so no two threads
                        // touch the same slot.
                        let slot = unsafe { &mut *prevouts_ptr.add(idx) };
                        populate_prevout(slot, &inputs[idx].prevout, branch_height, self.chain, empty_branch_utxo);
                        if slot.cache.is_none() {
                            if let Some(mempool) = self.mempool {
                                if let Some(output) = mempool.get_utxo(&inputs[idx].prevout) {
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

        ctx
    }
}
