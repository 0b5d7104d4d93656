//! Core sequencing logic: transaction ingress, the priority mempool, the
//! stub execution engine, block and batch assembly, chain-head tracking and
//! reorg handling. The RPC layer and the background loops sit on top of the
//! [`Blockchain`] handle defined here.

pub mod batch;
pub mod constants;
pub mod error;
pub mod execution;
pub mod fork_choice;
pub mod mempool;
pub mod reorg;
pub mod roots;
pub mod wal;
pub mod witness;

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use ethereum_types::{Bloom, H256, U256};
use seqrex_common::types::{
    Batch, Block, BlockBody, BlockHeader, ExecuteTransaction, Receipt, Transaction,
};
use seqrex_storage::Store;
use tracing::{debug, info, warn};

use crate::batch::BatchBuilder;
use crate::error::{ChainError, MempoolError};
use crate::execution::{ExecutionResult, execute_transaction};
use crate::fork_choice::ChainHeadTracker;
use crate::mempool::Mempool;
use crate::roots::{compute_receipts_root, compute_state_root};

#[derive(Debug, Clone)]
pub struct BlockchainOptions {
    pub block_gas_limit: u64,
    pub batch_size_limit: usize,
    pub batch_interval_ms: u64,
    pub chain_id: u64,
}

impl Default for BlockchainOptions {
    fn default() -> Self {
        Self {
            block_gas_limit: 30_000_000,
            batch_size_limit: 1000,
            batch_interval_ms: 2000,
            chain_id: 1337,
        }
    }
}

#[derive(Debug)]
pub struct Blockchain {
    pub store: Store,
    pub mempool: Mempool,
    pub head_tracker: ChainHeadTracker,
    batch_builder: Mutex<BatchBuilder>,
    options: BlockchainOptions,
}

impl Blockchain {
    pub fn new(store: Store, mempool: Mempool, options: BlockchainOptions) -> Self {
        Self {
            store,
            mempool,
            head_tracker: ChainHeadTracker::new(),
            batch_builder: Mutex::new(BatchBuilder::new()),
            options,
        }
    }

    pub fn options(&self) -> &BlockchainOptions {
        &self.options
    }

    // ── Ingress ────────────────────────────────────────────────────────

    /// Validates a transaction and admits it: legacy transactions go through
    /// the full accept pipeline into the mempool, opaque 0x7e envelopes are
    /// component-checked and queued for L1 forwarding.
    pub fn add_transaction(&self, transaction: Transaction) -> Result<H256, MempoolError> {
        match transaction {
            Transaction::Legacy(_) => self.add_legacy_transaction(transaction),
            Transaction::Execute(tx) => self.queue_for_forwarding(tx),
        }
    }

    fn add_legacy_transaction(&self, transaction: Transaction) -> Result<H256, MempoolError> {
        let Transaction::Legacy(ref tx) = transaction else {
            unreachable!("caller matched the variant");
        };

        let signature = tx.signature();
        signature.validate()?;

        // EIP-155 signatures must be bound to this chain; bare legacy
        // signatures are accepted for compatibility
        if let Some(chain_id) = signature.chain_id() {
            if chain_id != self.options.chain_id {
                return Err(seqrex_common::types::SignatureError::InvalidChainId(
                    self.options.chain_id,
                )
                .into());
            }
        }
        let sender = tx.recover_sender()?;

        if tx.gas_limit > self.options.block_gas_limit {
            return Err(MempoolError::GasLimitExceeded);
        }

        let account_nonce = self.store.get_nonce(&sender)?;
        if tx.nonce < account_nonce {
            return Err(MempoolError::NonceTooLow {
                expected: account_nonce,
                got: tx.nonce,
            });
        }

        // saturating precheck; the executor re-validates with checked math
        let max_cost = tx
            .value
            .saturating_add(tx.gas_price.saturating_mul(U256::from(tx.gas_limit)));
        if self.store.get_balance(&sender)? < max_cost {
            return Err(MempoolError::NotEnoughBalance);
        }

        let hash = transaction.compute_hash();
        if self.mempool.contains(&hash)? {
            return Err(MempoolError::DuplicateTransaction(hash));
        }

        let entry = self.mempool.prepare(transaction, sender);
        if !self.mempool.insert(entry)? {
            return Err(MempoolError::DuplicateTransaction(hash));
        }
        debug!(hash = %format!("{hash:#x}"), "Transaction admitted to mempool");
        Ok(hash)
    }

    fn queue_for_forwarding(&self, tx: ExecuteTransaction) -> Result<H256, MempoolError> {
        tx.signature()?.validate()?;
        let hash = tx.compute_hash();
        self.lock_batch()?.add_forwarded(tx);
        debug!(hash = %format!("{hash:#x}"), "Envelope queued for L1 forwarding");
        Ok(hash)
    }

    // ── Block building ─────────────────────────────────────────────────

    /// Drains the mempool and seals the next block. Failed executions are
    /// still included; their receipts record the failure and the consumed
    /// gas. Returns `None` when there is nothing to include.
    pub fn build_block(&self) -> Result<Option<Block>, ChainError> {
        let drained = self
            .mempool
            .drain_for_block(self.options.block_gas_limit, self.options.batch_size_limit)?;
        if drained.is_empty() {
            return Ok(None);
        }

        let current = self.store.get_block_number()?;
        let parent_hash = self
            .store
            .get_block_header(current)?
            .map(|header| header.hash())
            .unwrap_or_default();
        let number = current + 1;

        let mut receipts = Vec::with_capacity(drained.len());
        let mut gas_used = 0u64;
        for (index, entry) in drained.iter().enumerate() {
            let result = match &entry.transaction {
                Transaction::Legacy(tx) => {
                    execute_transaction(tx, entry.sender, &self.store, None)?
                }
                // envelopes are forwarded, not executed
                Transaction::Execute(_) => ExecutionResult {
                    succeeded: true,
                    gas_used: 0,
                },
            };
            gas_used += result.gas_used;
            receipts.push(Receipt {
                tx_hash: entry.hash,
                block_number: number,
                block_hash: H256::zero(),
                tx_index: index as u64,
                gas_used: result.gas_used,
                succeeded: result.succeeded,
                logs: vec![],
            });
        }

        let header = BlockHeader {
            parent_hash,
            number,
            timestamp: wall_clock_seconds(),
            gas_limit: self.options.block_gas_limit,
            gas_used,
            state_root: compute_state_root(&self.store)?,
            receipts_root: compute_receipts_root(&receipts),
            logs_bloom: Bloom::zero(),
        };
        let block = Block::new(
            header.clone(),
            BlockBody {
                transactions: drained
                    .into_iter()
                    .map(|entry| entry.transaction)
                    .collect(),
            },
        );

        let block_hash = block.hash();
        for receipt in &mut receipts {
            receipt.block_hash = block_hash;
        }
        self.store.finalize_block(&block, &receipts)?;
        self.head_tracker.set_head(Some(header.clone()))?;
        // proposed ahead of L1 derivation until the batch lands
        self.head_tracker.set_unsafe(Some(header.clone()))?;
        self.lock_batch()
            .map_err(ChainError::MempoolError)?
            .add_block(block.clone(), wall_clock_ms());

        info!(
            number,
            hash = %format!("{block_hash:#x}"),
            transactions = block.body.transactions.len(),
            gas_used,
            "Sealed block"
        );
        Ok(Some(block))
    }

    // ── Batches ────────────────────────────────────────────────────────

    /// Seals the in-flight batch when the block cap is reached or the batch
    /// interval elapsed.
    pub fn maybe_seal_batch(&self) -> Result<Option<Batch>, ChainError> {
        let mut builder = self.lock_batch().map_err(ChainError::MempoolError)?;
        if !builder.should_seal(
            wall_clock_ms(),
            self.options.batch_size_limit,
            self.options.batch_interval_ms,
        ) {
            return Ok(None);
        }
        let batch = builder.seal(wall_clock_seconds());
        info!(
            blocks = batch.blocks.len(),
            forwarded = batch.forwarded.len(),
            "Sealed batch"
        );
        Ok(Some(batch))
    }

    /// L1 acknowledged the batch: the submitted blocks become safe and the
    /// WAL no longer needs their transactions.
    pub fn on_batch_submitted(&self, batch: &Batch) -> Result<(), ChainError> {
        if let Some(block) = batch.blocks.last() {
            self.head_tracker.set_safe(Some(block.header.clone()))?;
        }
        self.mempool.compact_wal()?;
        Ok(())
    }

    // ── Reorgs ─────────────────────────────────────────────────────────

    /// Resets the chain to `common_ancestor` after an L2 divergence: the
    /// store rolls back, pointers ahead of the ancestor are truncated, and
    /// every in-flight batch is discarded.
    pub fn handle_l2_reorg(&self, common_ancestor: u64) -> Result<(), ChainError> {
        warn!(common_ancestor, "Handling L2 reorg");
        self.store.rewind_to_block(common_ancestor)?;
        let ancestor_header = if common_ancestor == 0 {
            None
        } else {
            self.store.get_block_header(common_ancestor)?
        };
        self.head_tracker.set_head(ancestor_header.clone())?;
        self.head_tracker
            .truncate_ahead_of(common_ancestor, ancestor_header)?;
        self.lock_batch().map_err(ChainError::MempoolError)?.discard();
        Ok(())
    }

    fn lock_batch(&self) -> Result<std::sync::MutexGuard<'_, BatchBuilder>, MempoolError> {
        self.batch_builder
            .lock()
            .map_err(|err| MempoolError::LockError(err.to_string()))
    }
}

pub fn wall_clock_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

pub fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ethereum_types::Address;
    use seqrex_common::types::{LegacyTransaction, SignatureError, TxKind};
    use seqrex_rlp::structs::Encoder;

    const CHAIN_ID: u64 = 1337;
    const ALICE_KEY: [u8; 32] = [0xa1; 32];
    const BOB: Address = Address::repeat_byte(0xb0);

    fn alice() -> Address {
        let mut tx = LegacyTransaction::default();
        tx.sign_inplace(&ALICE_KEY, Some(CHAIN_ID)).unwrap();
        tx.recover_sender().unwrap()
    }

    fn chain() -> Blockchain {
        Blockchain::new(
            Store::new_in_memory(),
            Mempool::new(10_000),
            BlockchainOptions::default(),
        )
    }

    /// A chain whose batches seal on the first `maybe_seal_batch` call.
    fn eager_chain() -> Blockchain {
        Blockchain::new(
            Store::new_in_memory(),
            Mempool::new(10_000),
            BlockchainOptions {
                batch_interval_ms: 0,
                ..Default::default()
            },
        )
    }

    fn signed_transfer(nonce: u64, value: u64, gas_price: u64, gas_limit: u64) -> Transaction {
        let mut tx = LegacyTransaction {
            nonce,
            gas_price: U256::from(gas_price),
            gas_limit,
            to: TxKind::Call(BOB),
            value: U256::from(value),
            ..Default::default()
        };
        tx.sign_inplace(&ALICE_KEY, Some(CHAIN_ID)).unwrap();
        Transaction::Legacy(tx)
    }

    #[test]
    fn ingress_rejects_invalid_signature_components() {
        let chain = chain();
        let tx = Transaction::Legacy(LegacyTransaction {
            v: 27,
            r: U256::zero(),
            s: U256::one(),
            ..Default::default()
        });
        assert!(matches!(
            chain.add_transaction(tx),
            Err(MempoolError::InvalidSignature(SignatureError::InvalidR))
        ));
        assert!(chain.mempool.is_empty().unwrap());
    }

    #[test]
    fn ingress_rejects_insufficient_funds() {
        let chain = chain();
        chain.store.set_balance(alice(), U256::from(1000)).unwrap();
        // required = 500 + 10 * 21000 > 1000
        let result = chain.add_transaction(signed_transfer(0, 500, 10, 21_000));
        assert!(matches!(result, Err(MempoolError::NotEnoughBalance)));
        assert!(chain.mempool.is_empty().unwrap());
    }

    #[test]
    fn ingress_rejects_duplicates() {
        let chain = chain();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        let tx = signed_transfer(0, 100, 1, 21_000);
        let hash = chain.add_transaction(tx.clone()).unwrap();
        assert!(matches!(
            chain.add_transaction(tx),
            Err(MempoolError::DuplicateTransaction(dup)) if dup == hash
        ));
        assert_eq!(chain.mempool.len().unwrap(), 1);
    }

    #[test]
    fn ingress_rejects_gas_limits_above_the_block_cap() {
        let chain = chain();
        chain
            .store
            .set_balance(alice(), U256::from(u64::MAX))
            .unwrap();
        let result = chain.add_transaction(signed_transfer(0, 1, 1, 30_000_001));
        assert!(matches!(result, Err(MempoolError::GasLimitExceeded)));
    }

    #[test]
    fn ingress_accepts_future_nonces() {
        let chain = chain();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        chain
            .add_transaction(signed_transfer(5, 100, 1, 21_000))
            .unwrap();
        assert_eq!(chain.mempool.len().unwrap(), 1);
    }

    #[test]
    fn ingress_rejects_stale_nonces() {
        let chain = chain();
        chain.store.set_nonce(alice(), 3).unwrap();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        assert!(matches!(
            chain.add_transaction(signed_transfer(2, 100, 1, 21_000)),
            Err(MempoolError::NonceTooLow {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn ingress_rejects_foreign_chain_ids() {
        let chain = chain();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        let mut tx = LegacyTransaction {
            gas_limit: 21_000,
            to: TxKind::Call(BOB),
            ..Default::default()
        };
        tx.sign_inplace(&ALICE_KEY, Some(1)).unwrap();
        assert!(matches!(
            chain.add_transaction(Transaction::Legacy(tx)),
            Err(MempoolError::InvalidSignature(
                SignatureError::InvalidChainId(CHAIN_ID)
            ))
        ));
    }

    #[test]
    fn envelope_ingress_queues_for_forwarding() {
        let chain = eager_chain();
        let mut body = Vec::new();
        Encoder::new(&mut body)
            .encode_field(&Bytes::from_static(b"l1 payload"))
            .encode_field(&27u64)
            .encode_field(&U256::one())
            .encode_field(&U256::one())
            .finish();
        let mut raw = vec![seqrex_common::constants::EXECUTE_TX_TYPE];
        raw.extend_from_slice(&body);
        let envelope = Transaction::decode_canonical(&raw).unwrap();

        let hash = chain.add_transaction(envelope).unwrap();
        assert_eq!(hash, seqrex_crypto::keccak_hash_h256(&raw));
        // it rides the next sealed batch instead of the mempool
        assert!(chain.mempool.is_empty().unwrap());
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        chain
            .add_transaction(signed_transfer(0, 1, 1, 21_000))
            .unwrap();
        chain.build_block().unwrap().unwrap();
        let batch = chain.maybe_seal_batch().unwrap().expect("batch sealed");
        assert_eq!(batch.forwarded.len(), 1);
        assert_eq!(batch.blocks.len(), 1);
    }

    #[test]
    fn build_block_executes_a_simple_transfer() {
        let chain = chain();
        let sender = alice();
        chain.store.set_balance(sender, U256::from(22_000)).unwrap();
        let hash = chain
            .add_transaction(signed_transfer(0, 100, 1, 21_000))
            .unwrap();

        let block = chain.build_block().unwrap().expect("block was built");

        assert_eq!(block.header.number, 1);
        assert_eq!(block.header.parent_hash, H256::zero());
        assert_eq!(block.header.gas_used, 21_000);
        assert_eq!(block.body.transactions.len(), 1);
        assert_eq!(chain.store.get_balance(&sender).unwrap(), U256::from(900));
        assert_eq!(chain.store.get_balance(&BOB).unwrap(), U256::from(100));
        assert_eq!(chain.store.get_nonce(&sender).unwrap(), 1);

        let receipt = chain.store.get_receipt(&hash).unwrap().unwrap();
        assert!(receipt.succeeded);
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.block_hash, block.hash());
        assert_eq!(receipt.tx_index, 0);

        // head and unsafe pointers follow the sealed block
        let heads = chain.head_tracker.snapshot().unwrap();
        assert_eq!(heads.head.unwrap().number, 1);
        assert_eq!(heads.unsafe_.unwrap().number, 1);
        assert!(heads.safe.is_none());
        assert!(chain.mempool.is_empty().unwrap());
    }

    #[test]
    fn state_root_is_stable_across_runs() {
        let build = || {
            let chain = chain();
            chain
                .store
                .set_balance(alice(), U256::from(22_000))
                .unwrap();
            chain
                .add_transaction(signed_transfer(0, 100, 1, 21_000))
                .unwrap();
            chain.build_block().unwrap().unwrap().header.state_root
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn failed_transactions_are_included_with_failed_receipts() {
        let chain = chain();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        // future nonce queues at ingress but fails at execution time
        let hash = chain
            .add_transaction(signed_transfer(7, 100, 1, 21_000))
            .unwrap();

        let block = chain.build_block().unwrap().expect("block was built");
        assert_eq!(block.body.transactions.len(), 1);
        let receipt = chain.store.get_receipt(&hash).unwrap().unwrap();
        assert!(!receipt.succeeded);
        assert_eq!(receipt.gas_used, 0);
        assert_eq!(chain.store.get_nonce(&alice()).unwrap(), 0);
    }

    #[test]
    fn blocks_chain_by_parent_hash() {
        let chain = chain();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        chain
            .add_transaction(signed_transfer(0, 1, 1, 21_000))
            .unwrap();
        let first = chain.build_block().unwrap().unwrap();
        chain
            .add_transaction(signed_transfer(1, 1, 1, 21_000))
            .unwrap();
        let second = chain.build_block().unwrap().unwrap();

        assert_eq!(second.header.number, 2);
        assert_eq!(second.header.parent_hash, first.hash());
    }

    #[test]
    fn empty_mempool_builds_no_block() {
        let chain = chain();
        assert!(chain.build_block().unwrap().is_none());
        assert!(chain.maybe_seal_batch().unwrap().is_none());
    }

    #[test]
    fn reorg_rewinds_store_pointers_and_batch() {
        let chain = chain();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        for nonce in 0..3 {
            chain
                .add_transaction(signed_transfer(nonce, 1, 1, 21_000))
                .unwrap();
            chain.build_block().unwrap().unwrap();
        }
        assert_eq!(chain.store.get_block_number().unwrap(), 3);

        chain.handle_l2_reorg(1).unwrap();

        assert_eq!(chain.store.get_block_number().unwrap(), 1);
        let heads = chain.head_tracker.snapshot().unwrap();
        assert_eq!(heads.head.unwrap().number, 1);
        assert_eq!(heads.unsafe_.unwrap().number, 1);
        // nothing left to seal
        assert!(chain.maybe_seal_batch().unwrap().is_none());
    }

    #[test]
    fn submitted_batches_advance_the_safe_pointer() {
        let chain = eager_chain();
        chain
            .store
            .set_balance(alice(), U256::from(10_000_000))
            .unwrap();
        chain
            .add_transaction(signed_transfer(0, 1, 1, 21_000))
            .unwrap();
        chain.build_block().unwrap().unwrap();
        let batch = chain.maybe_seal_batch().unwrap().expect("batch sealed");
        chain.on_batch_submitted(&batch).unwrap();
        assert_eq!(
            chain.head_tracker.snapshot().unwrap().safe.unwrap().number,
            1
        );
    }
}
