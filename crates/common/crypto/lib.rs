//! Cryptographic primitives for the sequencer: Keccak-256 hashing and
//! secp256k1 ECDSA signing/recovery with Ethereum address derivation.

pub mod ecdsa;
pub mod keccak;

pub use ecdsa::{EcdsaError, public_to_address, recover_public, sign_hash};
pub use keccak::{keccak_hash, keccak_hash_h256};
