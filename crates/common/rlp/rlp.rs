//! Recursive Length Prefix (RLP) encoding and decoding.
//!
//! RLP is the canonical serialization format for everything the sequencer
//! persists or ships over the wire: transactions, block headers, receipts,
//! batches, trie nodes and execution witnesses.
//!
//! - [`encode::RLPEncode`] / [`decode::RLPDecode`]: the core traits
//! - [`structs::Encoder`] / [`structs::Decoder`]: field-by-field helpers for
//!   struct (list) encodings

pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod structs;
