use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ethereum_types::{Address, H256, U256};
use seqrex_common::types::{Block, BlockHeader, ExecutionWitness, Receipt};
use seqrex_rlp::{decode::RLPDecode, encode::RLPEncode};
use tracing::info;

use crate::engine::{InMemoryEngine, KvEngine};
use crate::error::StoreError;
use crate::keys;

/// Account, receipt and block store.
///
/// The in-memory maps are authoritative for everything the executor touches;
/// every mutation is written through to the KV engine, and a fresh store
/// rehydrates accounts and the block counter from it on startup.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
    engine: Arc<dyn KvEngine>,
}

#[derive(Debug, Default, Clone)]
struct StoreInner {
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    receipts: HashMap<H256, Receipt>,
    headers: HashMap<u64, BlockHeader>,
    blocks: HashMap<u64, Block>,
    block_number: u64,
}

impl Store {
    pub fn new(engine: Arc<dyn KvEngine>) -> Result<Self, StoreError> {
        let store = Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            engine,
        };
        store.load_from_engine()?;
        Ok(store)
    }

    pub fn new_in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            engine: Arc::new(InMemoryEngine::new()),
        }
    }

    /// Rehydrates account state and the block counter from the engine.
    fn load_from_engine(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        for (key, value) in self.engine.iter_prefix(b"nonce:")? {
            let address = address_from_key(&key, b"nonce:")?;
            inner.nonces.insert(address, decode_u64(&value)?);
        }
        for (key, value) in self.engine.iter_prefix(b"balance:")? {
            let address = address_from_key(&key, b"balance:")?;
            inner.balances.insert(address, decode_u256(&value)?);
        }
        if let Some(value) = self.engine.get(keys::BLOCK_NUMBER_KEY)? {
            inner.block_number = decode_u64(&value)?;
        }
        if !inner.nonces.is_empty() || inner.block_number != 0 {
            info!(
                accounts = inner.nonces.len(),
                block_number = inner.block_number,
                "Rehydrated state from KV engine"
            );
        }
        Ok(())
    }

    // ── Accounts ───────────────────────────────────────────────────────

    pub fn get_nonce(&self, address: &Address) -> Result<u64, StoreError> {
        if let Some(nonce) = self.read()?.nonces.get(address) {
            return Ok(*nonce);
        }
        match self.engine.get(&keys::nonce_key(address))? {
            Some(value) => decode_u64(&value),
            None => Ok(0),
        }
    }

    pub fn get_balance(&self, address: &Address) -> Result<U256, StoreError> {
        if let Some(balance) = self.read()?.balances.get(address) {
            return Ok(*balance);
        }
        match self.engine.get(&keys::balance_key(address))? {
            Some(value) => decode_u256(&value),
            None => Ok(U256::zero()),
        }
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) -> Result<(), StoreError> {
        self.write()?.nonces.insert(address, nonce);
        self.engine
            .put(keys::nonce_key(&address), nonce.to_be_bytes().to_vec())
    }

    pub fn set_balance(&self, address: Address, balance: U256) -> Result<(), StoreError> {
        self.write()?.balances.insert(address, balance);
        self.engine
            .put(keys::balance_key(&address), balance.to_big_endian().to_vec())
    }

    pub fn increment_nonce(&self, address: Address) -> Result<(), StoreError> {
        let next = self.get_nonce(&address)?.wrapping_add(1);
        self.set_nonce(address, next)
    }

    /// All known accounts in ascending address order, as
    /// `(address, nonce, balance)` tuples. This is the iteration order the
    /// state-root computation relies on.
    pub fn iter_accounts(&self) -> Result<Vec<(Address, u64, U256)>, StoreError> {
        let inner = self.read()?;
        let mut addresses: Vec<Address> = inner
            .nonces
            .keys()
            .chain(inner.balances.keys())
            .copied()
            .collect();
        addresses.sort();
        addresses.dedup();
        Ok(addresses
            .into_iter()
            .map(|address| {
                (
                    address,
                    inner.nonces.get(&address).copied().unwrap_or_default(),
                    inner.balances.get(&address).copied().unwrap_or_default(),
                )
            })
            .collect())
    }

    // ── Receipts ───────────────────────────────────────────────────────

    pub fn put_receipt(&self, receipt: Receipt) -> Result<(), StoreError> {
        self.engine
            .put(keys::receipt_key(&receipt.tx_hash), receipt.encode_to_vec())?;
        self.write()?.receipts.insert(receipt.tx_hash, receipt);
        Ok(())
    }

    pub fn get_receipt(&self, tx_hash: &H256) -> Result<Option<Receipt>, StoreError> {
        if let Some(receipt) = self.read()?.receipts.get(tx_hash) {
            return Ok(Some(receipt.clone()));
        }
        self.engine
            .get(&keys::receipt_key(tx_hash))?
            .map(|value| Receipt::decode(&value).map_err(StoreError::RLPDecode))
            .transpose()
    }

    // ── Blocks ─────────────────────────────────────────────────────────

    /// Number of the latest sealed block; 0 before any block is sealed.
    pub fn get_block_number(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.block_number)
    }

    pub fn get_block_header(&self, number: u64) -> Result<Option<BlockHeader>, StoreError> {
        if let Some(header) = self.read()?.headers.get(&number) {
            return Ok(Some(header.clone()));
        }
        self.engine
            .get(&keys::header_key(number))?
            .map(|value| BlockHeader::decode(&value).map_err(StoreError::RLPDecode))
            .transpose()
    }

    pub fn get_block(&self, number: u64) -> Result<Option<Block>, StoreError> {
        if let Some(block) = self.read()?.blocks.get(&number) {
            return Ok(Some(block.clone()));
        }
        self.engine
            .get(&keys::block_key(number))?
            .map(|value| Block::decode(&value).map_err(StoreError::RLPDecode))
            .transpose()
    }

    pub fn get_latest_block(&self) -> Result<Option<Block>, StoreError> {
        let number = self.get_block_number()?;
        if number == 0 {
            return Ok(None);
        }
        self.get_block(number)
    }

    /// Seals a block into the store: header, body, receipts and the advanced
    /// block counter, all written through.
    pub fn finalize_block(&self, block: &Block, receipts: &[Receipt]) -> Result<(), StoreError> {
        let number = block.header.number;
        self.engine
            .put(keys::header_key(number), block.header.encode_to_vec())?;
        self.engine.put(keys::block_key(number), block.encode_to_vec())?;
        self.engine
            .put(keys::BLOCK_NUMBER_KEY.to_vec(), number.to_be_bytes().to_vec())?;
        for receipt in receipts {
            self.put_receipt(receipt.clone())?;
        }
        let mut inner = self.write()?;
        inner.headers.insert(number, block.header.clone());
        inner.blocks.insert(number, block.clone());
        inner.block_number = number;
        Ok(())
    }

    /// Rolls the block counter back to `number`, dropping newer blocks.
    /// Account state is not rewound; the stub keeps latest-state semantics.
    pub fn rewind_to_block(&self, number: u64) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let current = inner.block_number;
        for stale in (number + 1)..=current {
            inner.headers.remove(&stale);
            inner.blocks.remove(&stale);
            self.engine.delete(&keys::header_key(stale))?;
            self.engine.delete(&keys::block_key(stale))?;
        }
        inner.block_number = number;
        self.engine
            .put(keys::BLOCK_NUMBER_KEY.to_vec(), number.to_be_bytes().to_vec())
    }

    // ── Witnesses ──────────────────────────────────────────────────────

    /// Persists a block witness together with an index of the state nodes
    /// it touched and the code blobs it carries.
    pub fn put_witness(
        &self,
        block_hash: H256,
        witness: &ExecutionWitness,
    ) -> Result<(), StoreError> {
        self.engine
            .put(keys::witness_key(&block_hash), witness.encode_to_vec())?;
        for node_hash in &witness.state_nodes {
            self.engine
                .put(keys::state_node_key(node_hash), node_hash.as_bytes().to_vec())?;
        }
        for (code_hash, code) in &witness.codes {
            self.engine.put(keys::code_key(code_hash), code.to_vec())?;
        }
        Ok(())
    }

    pub fn get_witness(&self, block_hash: &H256) -> Result<Option<ExecutionWitness>, StoreError> {
        self.engine
            .get(&keys::witness_key(block_hash))?
            .map(|value| ExecutionWitness::decode(&value).map_err(StoreError::RLPDecode))
            .transpose()
    }

    /// Deep copy backed by a throwaway engine; mutations never reach the
    /// original store. Used for stateless re-execution.
    pub fn fork(&self) -> Result<Store, StoreError> {
        let inner = self.read()?.clone();
        Ok(Store {
            inner: Arc::new(RwLock::new(inner)),
            engine: Arc::new(InMemoryEngine::new()),
        })
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreInner>, StoreError> {
        self.inner
            .read()
            .map_err(|err| StoreError::LockError(err.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreInner>, StoreError> {
        self.inner
            .write()
            .map_err(|err| StoreError::LockError(err.to_string()))
    }
}

fn address_from_key(key: &[u8], prefix: &[u8]) -> Result<Address, StoreError> {
    let suffix = key.get(prefix.len()..).ok_or(StoreError::DecodeError)?;
    if suffix.len() != Address::len_bytes() {
        return Err(StoreError::DecodeError);
    }
    Ok(Address::from_slice(suffix))
}

fn decode_u64(value: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| StoreError::DecodeError)?;
    Ok(u64::from_be_bytes(bytes))
}

fn decode_u256(value: &[u8]) -> Result<U256, StoreError> {
    if value.len() != 32 {
        return Err(StoreError::DecodeError);
    }
    Ok(U256::from_big_endian(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_default_to_zero() {
        let store = Store::new_in_memory();
        let address = Address::repeat_byte(0x01);
        assert_eq!(store.get_nonce(&address).unwrap(), 0);
        assert_eq!(store.get_balance(&address).unwrap(), U256::zero());
    }

    #[test]
    fn nonce_and_balance_round_trip() {
        let store = Store::new_in_memory();
        let address = Address::repeat_byte(0x02);
        store.set_balance(address, U256::from(1000)).unwrap();
        store.set_nonce(address, 3).unwrap();
        store.increment_nonce(address).unwrap();
        assert_eq!(store.get_nonce(&address).unwrap(), 4);
        assert_eq!(store.get_balance(&address).unwrap(), U256::from(1000));
    }

    #[test]
    fn state_survives_engine_rehydration() {
        let engine = Arc::new(InMemoryEngine::new());
        {
            let store = Store::new(engine.clone()).unwrap();
            store
                .set_balance(Address::repeat_byte(0x03), U256::from(42))
                .unwrap();
            store.set_nonce(Address::repeat_byte(0x03), 7).unwrap();
        }
        // a new store over the same engine sees the persisted state
        let store = Store::new(engine).unwrap();
        assert_eq!(store.get_nonce(&Address::repeat_byte(0x03)).unwrap(), 7);
        assert_eq!(
            store.get_balance(&Address::repeat_byte(0x03)).unwrap(),
            U256::from(42)
        );
    }

    #[test]
    fn iter_accounts_is_address_ordered() {
        let store = Store::new_in_memory();
        store
            .set_balance(Address::repeat_byte(0xbb), U256::from(2))
            .unwrap();
        store
            .set_balance(Address::repeat_byte(0xaa), U256::from(1))
            .unwrap();
        store.set_nonce(Address::repeat_byte(0xcc), 5).unwrap();

        let accounts = store.iter_accounts().unwrap();
        let addresses: Vec<Address> = accounts.iter().map(|(address, _, _)| *address).collect();
        assert_eq!(
            addresses,
            vec![
                Address::repeat_byte(0xaa),
                Address::repeat_byte(0xbb),
                Address::repeat_byte(0xcc)
            ]
        );
        // account known only by nonce still shows up with zero balance
        assert_eq!(accounts[2].1, 5);
        assert_eq!(accounts[2].2, U256::zero());
    }

    #[test]
    fn finalize_and_fetch_block() {
        let store = Store::new_in_memory();
        let block = Block {
            header: BlockHeader {
                number: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let receipt = Receipt {
            tx_hash: H256::repeat_byte(0x0a),
            block_number: 1,
            block_hash: block.hash(),
            tx_index: 0,
            gas_used: 21_000,
            succeeded: true,
            logs: vec![],
        };
        store.finalize_block(&block, &[receipt.clone()]).unwrap();

        assert_eq!(store.get_block_number().unwrap(), 1);
        assert_eq!(store.get_block(1).unwrap(), Some(block.clone()));
        assert_eq!(store.get_block_header(1).unwrap(), Some(block.header));
        assert_eq!(
            store.get_receipt(&H256::repeat_byte(0x0a)).unwrap(),
            Some(receipt)
        );
    }

    #[test]
    fn rewind_drops_newer_blocks() {
        let store = Store::new_in_memory();
        for number in 1..=3 {
            let block = Block {
                header: BlockHeader {
                    number,
                    ..Default::default()
                },
                ..Default::default()
            };
            store.finalize_block(&block, &[]).unwrap();
        }
        store.rewind_to_block(1).unwrap();
        assert_eq!(store.get_block_number().unwrap(), 1);
        assert!(store.get_block(2).unwrap().is_none());
        assert!(store.get_block(1).unwrap().is_some());
    }

    #[test]
    fn fork_is_isolated() {
        let store = Store::new_in_memory();
        let address = Address::repeat_byte(0x04);
        store.set_balance(address, U256::from(10)).unwrap();

        let fork = store.fork().unwrap();
        fork.set_balance(address, U256::from(999)).unwrap();
        fork.increment_nonce(address).unwrap();

        assert_eq!(store.get_balance(&address).unwrap(), U256::from(10));
        assert_eq!(store.get_nonce(&address).unwrap(), 0);
    }
}
