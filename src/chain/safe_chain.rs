//! `SafeChain`: the validated, read-mostly view other subsystems (the
//! out-of-scope network/RPC/miner layers) consume (spec.md §6.2).
//!
//! This is the crate's public subscription surface: subscribe-to-block,
//! subscribe-to-tx, subscribe-to-ds-proof handlers are plain closures
//! stored behind a lock and invoked in commit order, grounded on the
//! teacher's `tokio::sync::broadcast`-based notification in `state/mod.rs`
//! but simplified to synchronous fan-out callbacks since this crate owns
//! no async runtime boundary of its own.

use parking_lot::RwLock;

use crate::hash::Hash32;
use crate::mempool::pool::Mempool;
use crate::primitives::{BlockRef, TxRef};

#[derive(Debug, Clone)]
pub enum ReorganizeEvent {
    Attached { branch_height: u64, incoming: Vec<BlockRef> },
    Reorganized { branch_height: u64, incoming: Vec<BlockRef>, outgoing: Vec<BlockRef> },
}

pub type BlockHandler = Box<dyn Fn(&ReorganizeEvent) + Send + Sync>;
pub type TxHandler = Box<dyn Fn(&TxRef) + Send + Sync>;
pub type DsProofHandler = Box<dyn Fn(&Hash32, &[u8]) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    block: Vec<BlockHandler>,
    tx: Vec<TxHandler>,
    ds_proof: Vec<DsProofHandler>,
}

/// The validated view exposed to callers outside the organizer/validator
/// core.
pub struct SafeChain {
    subscribers: RwLock<Subscribers>,
    stopped: std::sync::atomic::AtomicBool,
    ds_proofs: RwLock<std::collections::HashMap<Hash32, Vec<u8>>>,
}

impl Default for SafeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeChain {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Subscribers::default()),
            stopped: std::sync::atomic::AtomicBool::new(false),
            ds_proofs: RwLock::new(std::collections::HashMap::new()),
        }
    }

    pub fn subscribe_reorganize(&self, handler: BlockHandler) {
        self.subscribers.write().block.push(handler);
    }

    pub fn subscribe_tx(&self, handler: TxHandler) {
        self.subscribers.write().tx.push(handler);
    }

    pub fn subscribe_ds_proof(&self, handler: DsProofHandler) {
        self.subscribers.write().ds_proof.push(handler);
    }

    pub fn notify_reorganize(&self, event: ReorganizeEvent) {
        for handler in &self.subscribers.read().block {
            handler(&event);
        }
    }

    pub fn notify_tx(&self, tx: &TxRef) {
        for handler in &self.subscribers.read().tx {
            handler(tx);
        }
    }

    pub fn store_ds_proof(&self, txid: Hash32, proof: Vec<u8>) {
        self.ds_proofs.write().insert(txid, proof.clone());
        for handler in &self.subscribers.read().ds_proof {
            handler(&txid, &proof);
        }
    }

    pub fn fetch_ds_proof(&self, txid: &Hash32) -> Option<Vec<u8>> {
        self.ds_proofs.read().get(txid).cloned()
    }

    pub fn fetch_template(&self, mempool: &Mempool, max_size: usize, max_sigops: u32) -> Vec<TxRef> {
        mempool.build_template(max_size, max_sigops)
    }

    pub fn fetch_mempool(&self, mempool: &Mempool, maximum: usize) -> Vec<TxRef> {
        mempool.snapshot(maximum)
    }

    pub fn stop(&self) {
        self.stopped.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(std::sync::atomic::Ordering::SeqCst)
    }
}
