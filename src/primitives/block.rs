use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::hash::{merkle_root, sha256d, Hash32, ZERO_HASH};
use crate::primitives::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_hash: Hash32,
    pub merkle_root: Hash32,
    pub timestamp: u64,
    /// Compact difficulty target (Bitcoin "nBits"-shaped: mantissa +
    /// exponent packed into a u32), carried opaquely by the organizer and
    /// interpreted by `consensus::difficulty`.
    pub bits: u32,
    pub nonce: u64,
}

impl BlockHeader {
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(80);
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&self.prev_hash);
        data.extend_from_slice(&self.merkle_root);
        data.extend_from_slice(&self.timestamp.to_le_bytes());
        data.extend_from_slice(&self.bits.to_le_bytes());
        data.extend_from_slice(&self.nonce.to_le_bytes());
        data
    }

    pub fn calculate_hash(&self) -> Hash32 {
        sha256d(&self.serialize())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn genesis(timestamp: u64, bits: u32) -> Self {
        let coinbase = Transaction {
            version: 1,
            inputs: vec![crate::primitives::transaction::TxInput {
                prevout: crate::primitives::outpoint::OutPoint::coinbase(),
                unlocking_script: b"genesis".to_vec(),
                sequence: 0xffff_ffff,
            }],
            outputs: vec![],
            lock_time: 0,
        };
        let merkle = merkle_root(&[coinbase.calculate_hash()]);
        Self {
            header: BlockHeader {
                version: 1,
                prev_hash: ZERO_HASH,
                merkle_root: merkle,
                timestamp,
                bits,
                nonce: 0,
            },
            transactions: vec![coinbase],
        }
    }

    pub fn calculate_hash(&self) -> Hash32 {
        self.header.calculate_hash()
    }

    pub fn calculate_merkle_root(&self) -> Hash32 {
        let leaves: Vec<Hash32> = self.transactions.iter().map(|t| t.calculate_hash()).collect();
        merkle_root(&leaves)
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn serialized_size(&self) -> usize {
        let mut size = self.header.serialize().len();
        for tx in &self.transactions {
            size += tx.serialize().len();
        }
        size
    }
}

/// Immutable, reference-counted block handle (spec.md §3 `BlockRef`).
/// Shared by the pool, branch, validator, and subscriber notifications;
/// never mutated after construction.
#[derive(Debug)]
pub struct BlockData {
    pub block: Block,
    pub hash: Hash32,
    pub size: u32,
}

pub type BlockRef = Arc<BlockData>;

pub fn make_block_ref(block: Block) -> BlockRef {
    let hash = block.calculate_hash();
    let size = block.serialized_size() as u32;
    Arc::new(BlockData { block, hash, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_one_coinbase_tx() {
        let g = Block::genesis(1_600_000_000, 0x1d00ffff);
        assert_eq!(g.transactions.len(), 1);
        assert!(g.transactions[0].is_coinbase());
    }

    #[test]
    fn genesis_merkle_root_matches_coinbase_hash() {
        let g = Block::genesis(1_600_000_000, 0x1d00ffff);
        assert_eq!(g.calculate_merkle_root(), g.header.merkle_root);
    }

    #[test]
    fn hash_is_deterministic() {
        let g1 = Block::genesis(1, 2);
        let g2 = Block::genesis(1, 2);
        assert_eq!(g1.calculate_hash(), g2.calculate_hash());
    }

    #[test]
    fn different_timestamps_change_hash() {
        let a = Block::genesis(1, 2);
        let b = Block::genesis(2, 2);
        assert_ne!(a.calculate_hash(), b.calculate_hash());
    }
}
