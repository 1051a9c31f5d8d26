//! The organizer layer: the `BlockOrganizer`/`TransactionOrganizer`
//! entry points that drive the `check → accept → connect` pipelines end
//! to end, and the `sync` primitives they share (spec.md §4.7, §4.8,
//! §5).

pub mod block_organizer;
pub mod sync;
pub mod tx_organizer;

pub use block_organizer::BlockOrganizer;
pub use sync::{PriorityLock, Synchronizer};
pub use tx_organizer::TransactionOrganizer;
