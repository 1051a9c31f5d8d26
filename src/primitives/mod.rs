//! Core value types: outpoints/outputs, transactions, and blocks, plus
//! the immutable `Arc`-backed `TxRef`/`BlockRef` handles shared across
//! the populator, validator, organizer, and mempool layers.

pub mod block;
pub mod outpoint;
pub mod transaction;

pub use block::{make_block_ref, Block, BlockData, BlockHeader, BlockRef};
pub use outpoint::{OutPoint, Output};
pub use transaction::{make_tx_ref, Transaction, TxData, TxInput, TxRef};
