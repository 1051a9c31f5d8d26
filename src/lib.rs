//! Consensus-validating core for a Bitcoin-Cash-shaped chain.
//!
//! This crate owns the parts of a full node that decide whether a block
//! or transaction is admissible: the `check → accept → connect`
//! validator pipeline, the mempool's package-feerate DAG, the
//! fork-point `Branch`/`BlockPool` bookkeeping that lets a side chain
//! overtake the active one, and the `ChainStatePopulator` that projects
//! the consensus parameters the next block must satisfy.
//!
//! Persistent storage (`FastChain`), script interpretation
//! (`VerifyScript`), and everything above the validated view
//! (`SafeChain`) — networking, RPC, mining — are deliberately out of
//! scope; this crate consumes those as trait objects a host binary
//! supplies.

pub mod chain;
pub mod config;
pub mod consensus;
pub mod error;
pub mod hash;
pub mod mempool;
pub mod metrics;
pub mod network;
pub mod organize;
pub mod populate;
pub mod primitives;
pub mod validate;

pub use config::Settings;
pub use error::{CoreError, CoreResult};
pub use metrics::Metrics;
pub use network::{get_network, set_network, Network, NetworkKind};
