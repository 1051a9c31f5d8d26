//! Fork-tracking data structures: the `Branch` a candidate hangs off,
//! the `BlockPool` of side-branch tips, the `ChainState` projection, and
//! the `FastChain`/`SafeChain` interface seams (spec.md §3, §4.1-4.3,
//! §6).

pub mod block_pool;
pub mod branch;
pub mod chain_state;
pub mod fast_chain;
pub mod safe_chain;

pub use block_pool::BlockPool;
pub use branch::Branch;
pub use chain_state::{ChainState, ChainStatePopulator};
pub use fast_chain::{FastChain, InMemoryFastChain, UtxoEntry};
pub use safe_chain::SafeChain;
