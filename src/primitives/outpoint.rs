use serde::{Deserialize, Serialize};

use crate::hash::{hash_to_hex, Hash32};

/// Reference to a single transaction output. `index == u32::MAX` on a
/// null previous-txid marks a coinbase input (spec.md §4.4
/// `populate_prevout`: "skip if outpoint.is_null()").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Hash32,
    pub index: u32,
}

impl OutPoint {
    pub const NULL_INDEX: u32 = u32::MAX;

    pub fn new(txid: Hash32, index: u32) -> Self {
        Self { txid, index }
    }

    pub fn coinbase() -> Self {
        Self {
            txid: crate::hash::ZERO_HASH,
            index: Self::NULL_INDEX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid == crate::hash::ZERO_HASH && self.index == Self::NULL_INDEX
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", hash_to_hex(&self.txid), self.index)
    }
}

/// A transaction output: a value and an opaque locking script. The core
/// never interprets `script_pubkey` — that's `VerifyScript`'s job
/// (spec.md §1, "deliberately out of scope").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}
