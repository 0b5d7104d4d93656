//! In-memory Ethereum compatible Merkle Patricia Trie.
//!
//! Keys and values are raw byte strings; account tries hash their keys with
//! Keccak-256 before insertion (done by the caller). The trie is scoped to a
//! single state-root or receipts-root computation and is rebuilt per block.

mod nibbles;
mod node;

use ethereum_types::H256;
use lazy_static::lazy_static;
use seqrex_crypto::keccak_hash;
use seqrex_rlp::constants::RLP_NULL;

pub use nibbles::Nibbles;
pub use node::{BranchNode, ExtensionNode, LeafNode, Node};

lazy_static! {
    /// Hash of an empty trie, equal to keccak(RLP_NULL).
    pub static ref EMPTY_TRIE_HASH: H256 = H256(keccak_hash([RLP_NULL]));
}

/// RLP-encoded trie path
pub type PathRLP = Vec<u8>;
/// RLP-encoded trie value
pub type ValueRLP = Vec<u8>;

#[derive(Debug, Clone, Default)]
pub struct Trie {
    root: Option<Node>,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a value from the trie given its path.
    pub fn get(&self, path: &PathRLP) -> Option<&ValueRLP> {
        self.root
            .as_ref()
            .and_then(|root| root.get(Nibbles::from_bytes(path)))
    }

    /// Inserts a value into the trie. Empty values are not distinguished
    /// from absent ones by `root_hash`, matching the canonical trie rules.
    pub fn insert(&mut self, path: PathRLP, value: ValueRLP) {
        let path = Nibbles::from_bytes(&path);
        self.root = Some(match self.root.take() {
            Some(root) => root.insert(path, value),
            None => LeafNode {
                partial: path,
                value,
            }
            .into(),
        });
    }

    /// Keccak of the root node encoding; the canonical constant for an
    /// empty trie.
    pub fn root_hash(&self) -> H256 {
        match &self.root {
            Some(root) => H256(keccak_hash(root.encode_raw())),
            None => *EMPTY_TRIE_HASH,
        }
    }

    /// Computes the root of the trie holding the given key-value pairs
    /// without keeping the trie around.
    pub fn compute_hash_from_unsorted_iter(
        iter: impl Iterator<Item = (PathRLP, ValueRLP)>,
    ) -> H256 {
        let mut trie = Trie::new();
        for (path, value) in iter {
            trie.insert(path, value);
        }
        trie.root_hash()
    }
}

/// Byte equality between a computed and an expected root.
pub fn verify_root(computed: H256, expected: H256) -> bool {
    computed == expected
}
