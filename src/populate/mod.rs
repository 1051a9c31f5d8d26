//! Prevout/duplicate/pooled-flag populators that run ahead of
//! validation, fanned out across input buckets (spec.md §4.4).

pub mod base;
pub mod block;
pub mod tx;

pub use base::{populate_duplicate, populate_pooled, populate_prevout, PrevoutInfo, TxValidationContext};
pub use block::{BlockValidationContext, PopulateBlock};
pub use tx::PopulateTx;
