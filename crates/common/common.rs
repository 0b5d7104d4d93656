//! Core types shared across the sequencer: transactions, blocks, receipts,
//! batches and execution witnesses, together with their canonical RLP
//! encodings and the JSON serde helpers used at the RPC boundary.

pub use bytes::Bytes;
pub use ethereum_types::{Address, BigEndianHash, Bloom, H160, H256, U256};

pub mod constants;
pub mod serde_utils;
pub mod types;
