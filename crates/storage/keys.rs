//! Key scheme of the backing KV engine: an ASCII prefix followed by the raw
//! fixed-width bytes of the identifier.

use ethereum_types::{Address, H256};

pub const BLOCK_NUMBER_KEY: &[u8] = b"block_number";

pub fn nonce_key(address: &Address) -> Vec<u8> {
    [b"nonce:".as_slice(), address.as_bytes()].concat()
}

pub fn balance_key(address: &Address) -> Vec<u8> {
    [b"balance:".as_slice(), address.as_bytes()].concat()
}

pub fn receipt_key(tx_hash: &H256) -> Vec<u8> {
    [b"receipt:".as_slice(), tx_hash.as_bytes()].concat()
}

pub fn witness_key(block_hash: &H256) -> Vec<u8> {
    [b"witness:".as_slice(), block_hash.as_bytes()].concat()
}

pub fn state_node_key(hash: &H256) -> Vec<u8> {
    [b"state_node:".as_slice(), hash.as_bytes()].concat()
}

pub fn code_key(hash: &H256) -> Vec<u8> {
    [b"code:".as_slice(), hash.as_bytes()].concat()
}

pub fn header_key(number: u64) -> Vec<u8> {
    format!("header:{number:x}").into_bytes()
}

pub fn block_key(number: u64) -> Vec<u8> {
    format!("block:{number:x}").into_bytes()
}
