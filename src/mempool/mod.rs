//! The in-memory mempool: the `MempoolGraph` DAG, the `Mempool`
//! admission/eviction/ordering surface, and block-template assembly
//! (spec.md §3, §4.8).

pub mod entry;
pub mod pool;
pub mod template;

pub use entry::{MempoolGraph, TransactionEntry};
pub use pool::{Mempool, MempoolLimits};
pub use template::{assemble, BlockTemplate};
