//! `FastChain`: the persistent storage/UTXO contract the core consumes
//! but does not implement (spec.md §6.1 — "the persistent storage engine
//! ... is deliberately out of scope").
//!
//! `InMemoryFastChain` is a reference implementation good enough to
//! drive the organizer and populator in tests and examples; a real node
//! would back this trait with an on-disk UTXO/header store (the
//! teacher's `ZionStorage`/`heed` LMDB layer occupied this seam before
//! the storage engine was pulled out of scope).

use std::collections::HashMap;
use std::sync::RwLock;

use num_bigint::BigUint;

use crate::chain::chain_state::ChainState;
use crate::consensus::abla::AblaState;
use crate::error::{CoreError, CoreResult};
use crate::hash::Hash32;
use crate::primitives::{Block, BlockRef, OutPoint, Output, Transaction};

/// A UTXO lookup result: the output plus the metadata the populator and
/// validator need without a second round trip.
#[derive(Debug, Clone)]
pub struct UtxoEntry {
    pub output: Output,
    pub height: u64,
    pub median_time_past: u64,
    pub coinbase: bool,
}

/// Stored block header plus its ABLA state, the pair `get_header_and_abla_state` returns.
#[derive(Debug, Clone)]
pub struct HeaderEntry {
    pub block: BlockRef,
    pub abla_state: AblaState,
}

pub trait FastChain: Send + Sync {
    fn get_transaction_position(&self, hash: &Hash32, require_confirmed: bool) -> Option<(u64, u32)>;
    fn get_output(&self, outpoint: &OutPoint, branch_height: u64, require_confirmed: bool) -> Option<UtxoEntry>;
    fn get_utxo(&self, outpoint: &OutPoint, branch_height: u64) -> Option<UtxoEntry>;
    fn get_block_exists(&self, hash: &Hash32) -> bool;
    fn get_block_hash(&self, height: u64) -> Option<Hash32>;
    fn get_bits(&self, height: u64) -> Option<u32>;
    fn get_timestamp(&self, height: u64) -> Option<u64>;
    fn get_version(&self, height: u64) -> Option<i32>;
    fn get_last_height(&self) -> u64;
    fn get_header(&self, height: u64) -> Option<BlockRef>;
    fn get_header_and_abla_state(&self, height: u64) -> Option<HeaderEntry>;
    fn get_headers(&self, from: u64, to: u64) -> Vec<BlockRef>;
    fn get_branch_work(&self, from_height: u64, cap: Option<u64>) -> BigUint;
    fn get_utxo_pool_from(&self, from: u64, to: u64) -> HashMap<OutPoint, Output>;
    fn chain_state(&self) -> Option<ChainState>;
    fn is_stale_fast(&self, notify_limit_hours: u64, now: u64) -> bool;

    fn insert(&self, block: BlockRef, height: u64) -> CoreResult<()>;
    fn push(&self, tx: &Transaction) -> CoreResult<()>;
    fn reorganize(
        &self,
        fork_point: (Hash32, u64),
        incoming: &[BlockRef],
        outgoing: &[BlockRef],
    ) -> CoreResult<()>;
    fn prune_reorg_async(&self);
}

struct ChainRecord {
    block: BlockRef,
    abla_state: AblaState,
}

/// An in-memory `FastChain` good enough for tests and small embeddings.
/// Not durable across process restarts; a real deployment would back
/// this with a disk-resident store.
pub struct InMemoryFastChain {
    inner: RwLock<Inner>,
}

struct Inner {
    by_height: Vec<ChainRecord>,
    hash_to_height: HashMap<Hash32, u64>,
    utxo: HashMap<OutPoint, UtxoEntry>,
    spends: HashMap<OutPoint, u64>,
}

impl InMemoryFastChain {
    pub fn new(genesis: BlockRef, abla_state: AblaState) -> Self {
        let mut hash_to_height = HashMap::new();
        hash_to_height.insert(genesis.hash, 0);
        let mut utxo = HashMap::new();
        if let Some(coinbase) = genesis.block.coinbase() {
            for (i, output) in coinbase.outputs.iter().enumerate() {
                utxo.insert(
                    OutPoint::new(coinbase.calculate_hash(), i as u32),
                    UtxoEntry { output: output.clone(), height: 0, median_time_past: genesis.block.header.timestamp, coinbase: true },
                );
            }
        }
        Self {
            inner: RwLock::new(Inner {
                by_height: vec![ChainRecord { block: genesis, abla_state }],
                hash_to_height,
                utxo,
                spends: HashMap::new(),
            }),
        }
    }

    /// Acquire the write lock, surfacing poisoning as a context-carrying
    /// `anyhow::Error` rather than panicking — the only fallible step in
    /// an otherwise in-memory stand-in for a real disk-backed store.
    fn lock_write(&self) -> anyhow::Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| anyhow::anyhow!("chain state lock poisoned"))
    }

    fn apply_block(inner: &mut Inner, block: &BlockRef, height: u64) {
        for tx in &block.block.transactions {
            if !tx.is_coinbase() {
                for input in &tx.inputs {
                    inner.utxo.remove(&input.prevout);
                    inner.spends.insert(input.prevout, height);
                }
            }
            let txid = tx.calculate_hash();
            for (i, output) in tx.outputs.iter().enumerate() {
                inner.utxo.insert(
                    OutPoint::new(txid, i as u32),
                    UtxoEntry { output: output.clone(), height, median_time_past: block.block.header.timestamp, coinbase: tx.is_coinbase() },
                );
            }
        }
    }
}

impl FastChain for InMemoryFastChain {
    fn get_transaction_position(&self, hash: &Hash32, _require_confirmed: bool) -> Option<(u64, u32)> {
        let inner = self.inner.read().unwrap();
        for (height, record) in inner.by_height.iter().enumerate() {
            for (pos, tx) in record.block.block.transactions.iter().enumerate() {
                if &tx.calculate_hash() == hash {
                    return Some((height as u64, pos as u32));
                }
            }
        }
        None
    }

    fn get_output(&self, outpoint: &OutPoint, branch_height: u64, _require_confirmed: bool) -> Option<UtxoEntry> {
        self.get_utxo(outpoint, branch_height)
    }

    fn get_utxo(&self, outpoint: &OutPoint, branch_height: u64) -> Option<UtxoEntry> {
        let inner = self.inner.read().unwrap();
        let entry = inner.utxo.get(outpoint)?;
        if entry.height > branch_height {
            return None;
        }
        Some(entry.clone())
    }

    fn get_block_exists(&self, hash: &Hash32) -> bool {
        self.inner.read().unwrap().hash_to_height.contains_key(hash)
    }

    fn get_block_hash(&self, height: u64) -> Option<Hash32> {
        self.inner.read().unwrap().by_height.get(height as usize).map(|r| r.block.hash)
    }

    fn get_bits(&self, height: u64) -> Option<u32> {
        self.inner.read().unwrap().by_height.get(height as usize).map(|r| r.block.block.header.bits)
    }

    fn get_timestamp(&self, height: u64) -> Option<u64> {
        self.inner.read().unwrap().by_height.get(height as usize).map(|r| r.block.block.header.timestamp)
    }

    fn get_version(&self, height: u64) -> Option<i32> {
        self.inner.read().unwrap().by_height.get(height as usize).map(|r| r.block.block.header.version)
    }

    fn get_last_height(&self) -> u64 {
        self.inner.read().unwrap().by_height.len() as u64 - 1
    }

    fn get_header(&self, height: u64) -> Option<BlockRef> {
        self.inner.read().unwrap().by_height.get(height as usize).map(|r| r.block.clone())
    }

    fn get_header_and_abla_state(&self, height: u64) -> Option<HeaderEntry> {
        let inner = self.inner.read().unwrap();
        let record = inner.by_height.get(height as usize)?;
        Some(HeaderEntry { block: record.block.clone(), abla_state: record.abla_state })
    }

    fn get_headers(&self, from: u64, to: u64) -> Vec<BlockRef> {
        let inner = self.inner.read().unwrap();
        (from..=to.min(inner.by_height.len() as u64 - 1))
            .filter_map(|h| inner.by_height.get(h as usize).map(|r| r.block.clone()))
            .collect()
    }

    fn get_branch_work(&self, from_height: u64, cap: Option<u64>) -> BigUint {
        let inner = self.inner.read().unwrap();
        let end = cap.unwrap_or(inner.by_height.len() as u64 - 1).min(inner.by_height.len() as u64 - 1);
        let mut total = BigUint::from(0u32);
        for h in from_height..=end {
            if let Some(record) = inner.by_height.get(h as usize) {
                let target = crate::consensus::difficulty::bits_to_target(record.block.block.header.bits);
                if !target.eq(&BigUint::from(0u32)) {
                    total += crate::chain::branch::work_from_target(&target);
                }
            }
        }
        total
    }

    fn get_utxo_pool_from(&self, from: u64, to: u64) -> HashMap<OutPoint, Output> {
        let inner = self.inner.read().unwrap();
        let mut out = HashMap::new();
        for h in from..=to {
            if let Some(record) = inner.by_height.get(h as usize) {
                for tx in &record.block.block.transactions {
                    let txid = tx.calculate_hash();
                    for (i, output) in tx.outputs.iter().enumerate() {
                        out.insert(OutPoint::new(txid, i as u32), output.clone());
                    }
                }
            }
        }
        out
    }

    fn chain_state(&self) -> Option<ChainState> {
        None
    }

    fn is_stale_fast(&self, notify_limit_hours: u64, now: u64) -> bool {
        let inner = self.inner.read().unwrap();
        match inner.by_height.last() {
            Some(record) => now.saturating_sub(record.block.block.header.timestamp) > notify_limit_hours * 3600,
            None => true,
        }
    }

    fn insert(&self, block: BlockRef, height: u64) -> CoreResult<()> {
        let mut inner = self.lock_write().map_err(|e| CoreError::StorageFault(e.to_string()))?;
        if height as usize != inner.by_height.len() {
            return Err(CoreError::StorageFault(format!("insert at non-tip height {height}")));
        }
        Self::apply_block(&mut inner, &block, height);
        inner.hash_to_height.insert(block.hash, height);
        let abla_state = inner
            .by_height
            .last()
            .map(|r| r.abla_state)
            .unwrap_or_else(|| AblaState::genesis(&crate::consensus::AblaConfig::default()));
        inner.by_height.push(ChainRecord { block, abla_state });
        Ok(())
    }

    fn push(&self, _tx: &Transaction) -> CoreResult<()> {
        Ok(())
    }

    fn reorganize(&self, fork_point: (Hash32, u64), incoming: &[BlockRef], _outgoing: &[BlockRef]) -> CoreResult<()> {
        let mut inner = self.lock_write().map_err(|e| CoreError::StorageFault(e.to_string()))?;
        let (_, fork_height) = fork_point;
        inner.by_height.truncate(fork_height as usize + 1);
        inner.hash_to_height.retain(|_, h| *h <= fork_height);
        // Rebuild UTXO set from the surviving prefix, then replay incoming.
        let mut utxo = HashMap::new();
        let mut spends = HashMap::new();
        for (height, record) in inner.by_height.iter().enumerate() {
            for tx in &record.block.block.transactions {
                if !tx.is_coinbase() {
                    for input in &tx.inputs {
                        utxo.remove(&input.prevout);
                        spends.insert(input.prevout, height as u64);
                    }
                }
                let txid = tx.calculate_hash();
                for (i, output) in tx.outputs.iter().enumerate() {
                    utxo.insert(
                        OutPoint::new(txid, i as u32),
                        UtxoEntry { output: output.clone(), height: height as u64, median_time_past: record.block.block.header.timestamp, coinbase: tx.is_coinbase() },
                    );
                }
            }
        }
        inner.utxo = utxo;
        inner.spends = spends;

        for block in incoming {
            let height = inner.by_height.len() as u64;
            Self::apply_block(&mut inner, block, height);
            inner.hash_to_height.insert(block.hash, height);
            let abla_state = inner.by_height.last().map(|r| r.abla_state).unwrap_or_else(|| AblaState::genesis(&crate::consensus::AblaConfig::default()));
            inner.by_height.push(ChainRecord { block: block.clone(), abla_state });
        }
        Ok(())
    }

    fn prune_reorg_async(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::make_block_ref;

    fn genesis_chain() -> InMemoryFastChain {
        let genesis = make_block_ref(Block::genesis(1_600_000_000, 0x1d00ffff));
        InMemoryFastChain::new(genesis, AblaState::genesis(&crate::consensus::AblaConfig::default()))
    }

    #[test]
    fn genesis_is_queryable_at_height_zero() {
        let chain = genesis_chain();
        assert_eq!(chain.get_last_height(), 0);
        assert!(chain.get_header(0).is_some());
    }

    #[test]
    fn insert_rejects_non_tip_height() {
        let chain = genesis_chain();
        let genesis = chain.get_header(0).unwrap();
        assert!(chain.insert(genesis, 5).is_err());
    }
}
