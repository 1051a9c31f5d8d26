//! Block-template assembly result: the ordered transaction list and the
//! merkle witness info a miner needs to build a candidate block
//! (spec.md §4.8, "emit `(ordered_txs, merkle_witness_info)`").

use crate::hash::{merkle_root, Hash32};
use crate::mempool::pool::Mempool;
use crate::primitives::TxRef;

#[derive(Debug, Clone)]
pub struct BlockTemplate {
    pub ordered_txs: Vec<TxRef>,
    pub merkle_witness_root: Hash32,
    pub total_size: u32,
}

/// `merkle_witness_root` covers only the template's own transactions —
/// the caller prepends the coinbase hash before taking the block's real
/// merkle root, since the coinbase depends on the total fees this
/// template collects.
pub fn assemble(mempool: &Mempool, max_size: usize, max_sigops: u32) -> BlockTemplate {
    let ordered_txs = mempool.build_template(max_size, max_sigops);
    let leaves: Vec<Hash32> = ordered_txs.iter().map(|tx| tx.hash).collect();
    let total_size = ordered_txs.iter().map(|tx| tx.size).sum();
    BlockTemplate { merkle_witness_root: merkle_root(&leaves), total_size, ordered_txs }
}
