use ethereum_types::{H256, U256};
use seqrex_common::types::Receipt;
use seqrex_crypto::keccak_hash;
use seqrex_rlp::encode::{RLPEncode, encode};
use seqrex_rlp::structs::Encoder;
use seqrex_storage::Store;
use seqrex_trie::Trie;

use crate::error::ChainError;

/// RLP of an account leaf: `[nonce, balance, storage_root, code_hash]`.
/// The stub engine neither merkleizes storage nor deploys code, so the
/// trailing roots are fixed at zero.
fn account_rlp(nonce: u64, balance: U256) -> Vec<u8> {
    let mut buf = Vec::new();
    Encoder::new(&mut buf)
        .encode_field(&nonce)
        .encode_field(&balance)
        .encode_field(&H256::zero())
        .encode_field(&H256::zero())
        .finish();
    buf
}

/// Builds the account trie over all known accounts, keyed by
/// `keccak(address)`, iterating in ascending address order.
pub fn compute_state_root(state: &Store) -> Result<H256, ChainError> {
    let mut trie = Trie::new();
    for (address, nonce, balance) in state.iter_accounts()? {
        trie.insert(
            keccak_hash(address.as_bytes()).to_vec(),
            account_rlp(nonce, balance),
        );
    }
    Ok(trie.root_hash())
}

/// Root of the index-keyed receipts trie for one block.
pub fn compute_receipts_root(receipts: &[Receipt]) -> H256 {
    Trie::compute_hash_from_unsorted_iter(
        receipts
            .iter()
            .enumerate()
            .map(|(index, receipt)| (encode(index as u64), receipt.encode_to_vec())),
    )
}

pub use seqrex_trie::verify_root;

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::Address;
    use seqrex_trie::EMPTY_TRIE_HASH;

    #[test]
    fn empty_state_has_the_empty_trie_root() {
        let state = Store::new_in_memory();
        assert_eq!(compute_state_root(&state).unwrap(), *EMPTY_TRIE_HASH);
    }

    #[test]
    fn state_root_is_insertion_order_invariant() {
        let accounts = [
            (Address::repeat_byte(0x01), 1u64, U256::from(100)),
            (Address::repeat_byte(0x02), 2u64, U256::from(200)),
            (Address::repeat_byte(0x03), 0u64, U256::from(300)),
        ];

        let forward = Store::new_in_memory();
        for (address, nonce, balance) in accounts {
            forward.set_nonce(address, nonce).unwrap();
            forward.set_balance(address, balance).unwrap();
        }
        let backward = Store::new_in_memory();
        for (address, nonce, balance) in accounts.iter().rev() {
            backward.set_nonce(*address, *nonce).unwrap();
            backward.set_balance(*address, *balance).unwrap();
        }

        let root = compute_state_root(&forward).unwrap();
        assert_eq!(root, compute_state_root(&backward).unwrap());
        // and computing twice over the same state is stable
        assert_eq!(root, compute_state_root(&forward).unwrap());
        assert!(verify_root(root, root));
    }

    #[test]
    fn state_root_reflects_balance_changes() {
        let state = Store::new_in_memory();
        state
            .set_balance(Address::repeat_byte(0x01), U256::from(1))
            .unwrap();
        let before = compute_state_root(&state).unwrap();
        state
            .set_balance(Address::repeat_byte(0x01), U256::from(2))
            .unwrap();
        assert_ne!(before, compute_state_root(&state).unwrap());
    }

    #[test]
    fn receipts_root_depends_on_order_and_content() {
        let receipt = |index: u64, gas: u64| Receipt {
            tx_hash: H256::repeat_byte(index as u8),
            block_number: 1,
            block_hash: H256::zero(),
            tx_index: index,
            gas_used: gas,
            succeeded: true,
            logs: vec![],
        };
        let root = compute_receipts_root(&[receipt(0, 21_000), receipt(1, 42_000)]);
        let reordered = compute_receipts_root(&[receipt(1, 42_000), receipt(0, 21_000)]);
        assert_ne!(root, reordered);
        assert_eq!(compute_receipts_root(&[]), *EMPTY_TRIE_HASH);
    }
}
