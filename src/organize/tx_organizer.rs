//! `TransactionOrganizer`: the `check → accept → connect` pipeline for a
//! loose transaction plus mempool admission, and the double-spend-proof
//! relay (spec.md §4.8).
//!
//! Grounded on the teacher's `mempool/mod.rs` transaction-submission flow
//! (validate, then admit under a dedicated lock distinct from the block
//! lock), reshaped around `PriorityLock::acquire_low` so a competing
//! block always wins contention over the chain mutex.

use crate::chain::chain_state::ChainStatePopulator;
use crate::chain::fast_chain::FastChain;
use crate::chain::safe_chain::SafeChain;
use crate::error::{CoreError, CoreResult};
use crate::hash::Hash32;
use crate::mempool::pool::Mempool;
use crate::network::Network;
use crate::organize::sync::PriorityLock;
use crate::populate::tx::PopulateTx;
use crate::primitives::TxRef;
use crate::validate::script::VerifyScript;
use crate::validate::transaction::ValidateTransaction;

pub struct TransactionOrganizer<'a> {
    pub chain: &'a dyn FastChain,
    pub safe_chain: &'a SafeChain,
    pub mempool: &'a Mempool,
    pub network: &'a Network,
    pub verifier: &'a dyn VerifyScript,
    pub lock: &'a PriorityLock,
    pub buckets: usize,
}

impl<'a> TransactionOrganizer<'a> {
    /// Runs the full pipeline and, on success, admits the transaction to
    /// the mempool and notifies subscribers. Returns the transaction's
    /// fee.
    pub fn organize(&self, tx: TxRef) -> CoreResult<u64> {
        if self.mempool.contains(&tx.hash) || self.chain.get_transaction_position(&tx.hash, true).is_some() {
            return Err(CoreError::AlreadyPresent);
        }
        ValidateTransaction::check(&tx, self.network.retarget)?;

        let _guard = self.lock.acquire_low();

        let populator_state = ChainStatePopulator::new(self.chain, self.network);
        let state = populator_state.populate(None).ok_or(CoreError::ChainStateUnavailable)?;

        let populate_tx = PopulateTx { chain: self.chain, mempool: Some(self.mempool), allow_collisions: false, buckets: self.buckets };
        let ctx = populate_tx.populate(&tx, &state);
        if ctx.duplicate {
            return Err(CoreError::DuplicatedTransaction);
        }

        let fee = ValidateTransaction::accept(&tx, &ctx).map_err(|e| {
            log::debug!("tx {} rejected at accept: {e}", crate::hash::hash_to_hex(&tx.hash));
            e
        })?;
        let sigchecks = ValidateTransaction::connect(&tx, state.enabled_forks(), self.verifier, self.buckets).map_err(|e| {
            log::debug!("tx {} rejected at connect: {e}", crate::hash::hash_to_hex(&tx.hash));
            e
        })?;

        self.chain.push(&tx.tx)?;
        let branch_height = state.height.saturating_sub(1);
        self.mempool
            .add(tx.clone(), fee, sigchecks, |outpoint| self.chain.get_utxo(outpoint, branch_height).is_some())?;
        log::info!("admitted tx {} into mempool, fee={fee}", crate::hash::hash_to_hex(&tx.hash));
        self.safe_chain.notify_tx(&tx);
        Ok(fee)
    }

    /// Relay a double-spend proof: store it and fan it out to
    /// subscribers (spec.md §4.8 "double-spend-proof handling").
    pub fn organize_double_spend_proof(&self, txid: Hash32, proof: Vec<u8>) {
        self.safe_chain.store_ds_proof(txid, proof);
    }

    pub fn fetch_template(&self, max_size: usize, max_sigops: u32) -> Vec<TxRef> {
        self.safe_chain.fetch_template(self.mempool, max_size, max_sigops)
    }

    pub fn fetch_mempool(&self, maximum: usize) -> Vec<TxRef> {
        self.safe_chain.fetch_mempool(self.mempool, maximum)
    }

    pub fn fetch_ds_proof(&self, txid: &Hash32) -> Option<Vec<u8>> {
        self.safe_chain.fetch_ds_proof(txid)
    }
}
