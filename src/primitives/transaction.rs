use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::hash::{sha256d, Hash32};
use crate::primitives::outpoint::{OutPoint, Output};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prevout: OutPoint,
    /// Opaque unlocking script / witness bytes. Never interpreted here —
    /// passed verbatim to the external `VerifyScript` contract.
    pub unlocking_script: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    pub fn is_coinbase(&self) -> bool {
        self.prevout.is_null()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
}

impl Transaction {
    /// Canonical serialization used for hashing and the size-based sigop
    /// upper bound (spec.md §4.5 `check`: "sigop upper bound using
    /// canonical serialization size").
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            data.extend_from_slice(&input.prevout.txid);
            data.extend_from_slice(&input.prevout.index.to_le_bytes());
            data.extend_from_slice(&(input.unlocking_script.len() as u32).to_le_bytes());
            data.extend_from_slice(&input.unlocking_script);
            data.extend_from_slice(&input.sequence.to_le_bytes());
        }
        data.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_le_bytes());
            data.extend_from_slice(&(output.script_pubkey.len() as u32).to_le_bytes());
            data.extend_from_slice(&output.script_pubkey);
        }
        data.extend_from_slice(&self.lock_time.to_le_bytes());
        data
    }

    pub fn calculate_hash(&self) -> Hash32 {
        sha256d(&self.serialize())
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// BIP68: a sequence number with the disable bit set opts an input out
    /// of relative-lock-time enforcement (SPEC_FULL §B).
    pub fn is_final(&self, height: u64, median_time_past: u64) -> bool {
        if self.lock_time == 0 {
            return true;
        }
        const LOCKTIME_THRESHOLD: u32 = 500_000_000;
        let locked_by_time = self.lock_time >= LOCKTIME_THRESHOLD;
        let current = if locked_by_time {
            median_time_past
        } else {
            height
        };
        if (self.lock_time as u64) < current {
            return true;
        }
        // A transaction is final if every input opts out of sequence
        // locking, regardless of the lock_time comparison above.
        self.inputs
            .iter()
            .all(|i| i.sequence == 0xffff_ffff)
    }
}

/// Immutable, reference-counted transaction handle shared by the pool,
/// mempool graph, and validator (spec.md §3 `TxRef`). Cached fields are
/// computed once at construction; nothing here is mutated afterward —
/// per-validation state lives in a separate `TxValidationContext`
/// (see `validate::transaction`), matching the "dedicated value the
/// validator owns for the pass" guidance in spec.md §9.
#[derive(Debug)]
pub struct TxData {
    pub tx: Transaction,
    pub hash: Hash32,
    pub size: u32,
}

pub type TxRef = Arc<TxData>;

pub fn make_tx_ref(tx: Transaction) -> TxRef {
    let hash = tx.calculate_hash();
    let size = tx.serialize().len() as u32;
    Arc::new(TxData { tx, hash, size })
}
