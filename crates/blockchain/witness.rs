use std::collections::HashSet;

use bytes::Bytes;
use ethereum_types::{Address, H256};
use seqrex_common::types::{Block, BlockHeader, ExecutionWitness, Transaction};
use seqrex_crypto::keccak_hash_h256;
use seqrex_storage::Store;

use crate::error::ChainError;
use crate::execution::execute_transaction;

/// Accumulates everything one block build touches. One instance per build,
/// never shared across threads.
#[derive(Debug, Default)]
pub struct WitnessBuilder {
    state_nodes: Vec<H256>,
    seen_nodes: HashSet<H256>,
    codes: Vec<(H256, Bytes)>,
    seen_codes: HashSet<H256>,
    block_headers: Vec<BlockHeader>,
}

impl WitnessBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the state-trie node for an accessed account.
    pub fn track_address(&mut self, address: &Address) {
        self.track_state_node(keccak_hash_h256(address.as_bytes()));
    }

    pub fn track_state_node(&mut self, node_hash: H256) {
        if self.seen_nodes.insert(node_hash) {
            self.state_nodes.push(node_hash);
        }
    }

    pub fn track_code(&mut self, code: &Bytes) {
        let code_hash = keccak_hash_h256(code);
        if self.seen_codes.insert(code_hash) {
            self.codes.push((code_hash, code.clone()));
        }
    }

    pub fn track_block_header(&mut self, header: BlockHeader) {
        self.block_headers.push(header);
    }

    /// Snapshots the accumulated items, attaching the parent header when one
    /// is provided.
    pub fn build(mut self, parent_header: Option<BlockHeader>) -> ExecutionWitness {
        if let Some(header) = parent_header {
            self.block_headers.push(header);
        }
        ExecutionWitness {
            state_nodes: self.state_nodes,
            codes: self.codes,
            block_headers: self.block_headers,
        }
    }
}

/// Re-executes every transaction of a sealed block against a forked copy of
/// the state with a witness builder attached. No mutation escapes the fork.
pub fn generate_block_witness(block: &Block, state: &Store) -> Result<ExecutionWitness, ChainError> {
    let fork = state.fork()?;
    let mut builder = WitnessBuilder::new();

    for transaction in &block.body.transactions {
        let Transaction::Legacy(tx) = transaction else {
            continue;
        };
        let sender = tx
            .recover_sender()
            .map_err(|err| ChainError::WitnessGeneration(err.to_string()))?;
        execute_transaction(tx, sender, &fork, Some(&mut builder))?;
    }

    let parent_header = match block.header.number.checked_sub(1) {
        Some(parent_number) if parent_number > 0 => state.get_block_header(parent_number)?,
        _ => None,
    };
    Ok(builder.build(parent_header))
}
