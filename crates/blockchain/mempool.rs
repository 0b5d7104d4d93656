use std::collections::{BinaryHeap, HashMap};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use ethereum_types::{Address, H256, U256};
use seqrex_common::types::{MempoolTransaction, Transaction};
use tracing::warn;

use crate::error::MempoolError;
use crate::wal::TxWal;

/// Priority-ordered transaction pool with a durable write-ahead log.
///
/// One mutex protects the heap, the hash index and the WAL handle together;
/// `insert` fsyncs inside the lock so the on-disk order matches the accept
/// order. Capacity is a hard bound: when full, inserts are rejected, nothing
/// is evicted.
#[derive(Debug)]
pub struct Mempool {
    inner: Mutex<MempoolInner>,
    capacity: usize,
    sequence: AtomicU64,
}

#[derive(Debug, Default)]
struct MempoolInner {
    heap: BinaryHeap<HeapEntry>,
    index: HashMap<H256, MempoolTransaction>,
    wal: Option<TxWal>,
}

/// Heap key mirroring [`MempoolTransaction`]'s ordering. Entries are evicted
/// lazily: a popped entry whose hash left the index is simply skipped.
#[derive(Debug, PartialEq, Eq)]
struct HeapEntry {
    priority: U256,
    received_at: u64,
    hash: H256,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.received_at.cmp(&self.received_at))
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Mempool {
    /// Volatile pool without a WAL.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(MempoolInner::default()),
            capacity,
            sequence: AtomicU64::new(0),
        }
    }

    /// Pool backed by a WAL at `path`. Existing records are replayed,
    /// skipping duplicates and entries whose sender no longer recovers.
    pub fn with_wal(capacity: usize, path: impl AsRef<Path>) -> Result<Self, MempoolError> {
        let (wal, replayed) = TxWal::open(path)?;
        let pool = Self::new(capacity);
        pool.inner
            .lock()
            .map_err(|err| MempoolError::LockError(err.to_string()))?
            .wal = Some(wal);

        for transaction in replayed {
            let sender = match &transaction {
                Transaction::Legacy(tx) => match tx.recover_sender() {
                    Ok(sender) => sender,
                    Err(err) => {
                        warn!("Dropping WAL transaction with unrecoverable sender: {err}");
                        continue;
                    }
                },
                // opaque envelopes never lived in the pool
                Transaction::Execute(_) => continue,
            };
            let entry = MempoolTransaction::new(transaction, sender, pool.next_sequence());
            // replay bypasses the WAL append: the record is already on disk
            if let Err(err) = pool.insert_inner(entry, false) {
                warn!("Dropping WAL transaction: {err}");
            }
        }
        Ok(pool)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Stamps the entry with the pool's monotonic receive counter.
    pub fn prepare(&self, transaction: Transaction, sender: Address) -> MempoolTransaction {
        MempoolTransaction::new(transaction, sender, self.next_sequence())
    }

    /// Inserts a transaction. Returns `Ok(false)` if its hash is already
    /// resident; fails with [`MempoolError::Capacity`] when full. The WAL
    /// record is synced before this returns `Ok(true)`.
    pub fn insert(&self, entry: MempoolTransaction) -> Result<bool, MempoolError> {
        self.insert_inner(entry, true)
    }

    fn insert_inner(&self, entry: MempoolTransaction, log: bool) -> Result<bool, MempoolError> {
        let mut inner = self.lock()?;
        if inner.index.contains_key(&entry.hash) {
            return Ok(false);
        }
        if inner.index.len() >= self.capacity {
            return Err(MempoolError::Capacity);
        }
        if log {
            if let Some(wal) = inner.wal.as_mut() {
                wal.append(&entry.transaction.encode_canonical_to_vec())?;
            }
        }
        inner.heap.push(HeapEntry {
            priority: entry.priority,
            received_at: entry.received_at,
            hash: entry.hash,
        });
        inner.index.insert(entry.hash, entry);
        Ok(true)
    }

    pub fn contains(&self, hash: &H256) -> Result<bool, MempoolError> {
        Ok(self.lock()?.index.contains_key(hash))
    }

    pub fn remove(&self, hash: &H256) -> Result<(), MempoolError> {
        self.lock()?.index.remove(hash);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, MempoolError> {
        Ok(self.lock()?.index.len())
    }

    pub fn is_empty(&self) -> Result<bool, MempoolError> {
        Ok(self.lock()?.index.is_empty())
    }

    /// Pops the strictly highest-priority transaction, ties broken by
    /// earliest receipt.
    pub fn pop_highest_priority(&self) -> Result<Option<MempoolTransaction>, MempoolError> {
        let mut inner = self.lock()?;
        while let Some(top) = inner.heap.pop() {
            if let Some(entry) = inner.index.remove(&top.hash) {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Drains transactions in priority order until either cap is reached.
    /// A transaction whose gas limit does not fit the remaining block gas
    /// stops the drain and stays resident; nothing else is disturbed.
    pub fn drain_for_block(
        &self,
        gas_limit: u64,
        max_count: usize,
    ) -> Result<Vec<MempoolTransaction>, MempoolError> {
        let mut inner = self.lock()?;
        let mut drained = Vec::new();
        let mut remaining_gas = gas_limit;

        while drained.len() < max_count {
            let Some(top) = inner.heap.pop() else {
                break;
            };
            let Some(entry) = inner.index.get(&top.hash) else {
                // lazily evicted
                continue;
            };
            if entry.transaction.gas_limit() > remaining_gas {
                inner.heap.push(top);
                break;
            }
            remaining_gas -= entry.transaction.gas_limit();
            let entry = inner
                .index
                .remove(&top.hash)
                .unwrap_or_else(|| unreachable!("entry checked above"));
            drained.push(entry);
        }
        Ok(drained)
    }

    /// Rewrites the WAL to contain only still-resident transactions.
    /// Called after each successful batch submission.
    pub fn compact_wal(&self) -> Result<(), MempoolError> {
        let mut inner = self.lock()?;
        let resident: Vec<Vec<u8>> = inner
            .index
            .values()
            .map(|entry| entry.transaction.encode_canonical_to_vec())
            .collect();
        if let Some(wal) = inner.wal.as_mut() {
            wal.rewrite(resident.iter().map(Vec::as_slice))?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MempoolInner>, MempoolError> {
        self.inner
            .lock()
            .map_err(|err| MempoolError::LockError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::Address;
    use seqrex_common::types::{LegacyTransaction, Transaction};

    fn pool() -> Mempool {
        Mempool::new(1000)
    }

    fn legacy(nonce: u64, gas_price: u64, gas_limit: u64) -> Transaction {
        Transaction::Legacy(LegacyTransaction {
            nonce,
            gas_price: U256::from(gas_price),
            gas_limit,
            v: 27,
            r: U256::one(),
            s: U256::one(),
            ..Default::default()
        })
    }

    #[test]
    fn duplicate_insert_returns_false() {
        let pool = pool();
        let entry = pool.prepare(legacy(0, 100, 21_000), Address::zero());
        let hash = entry.hash;
        assert!(pool.insert(entry.clone()).unwrap());
        assert!(!pool.insert(entry).unwrap());
        assert!(pool.contains(&hash).unwrap());
        assert_eq!(pool.len().unwrap(), 1);
    }

    #[test]
    fn pop_is_priority_ordered_with_fifo_ties() {
        let pool = pool();
        let low = pool.prepare(legacy(0, 50, 21_000), Address::zero());
        let high_first = pool.prepare(legacy(1, 100, 21_000), Address::zero());
        let high_second = pool.prepare(legacy(2, 100, 21_000), Address::zero());
        pool.insert(low.clone()).unwrap();
        pool.insert(high_second.clone()).unwrap();
        pool.insert(high_first.clone()).unwrap();

        // receive order decides between equal prices
        assert_eq!(
            pool.pop_highest_priority().unwrap().unwrap().hash,
            high_first.hash
        );
        assert_eq!(
            pool.pop_highest_priority().unwrap().unwrap().hash,
            high_second.hash
        );
        assert_eq!(pool.pop_highest_priority().unwrap().unwrap().hash, low.hash);
        assert!(pool.pop_highest_priority().unwrap().is_none());
    }

    #[test]
    fn capacity_is_a_hard_bound() {
        let pool = Mempool::new(2);
        pool.insert(pool.prepare(legacy(0, 1, 21_000), Address::zero()))
            .unwrap();
        pool.insert(pool.prepare(legacy(1, 1, 21_000), Address::zero()))
            .unwrap();
        let overflow = pool.prepare(legacy(2, 1, 21_000), Address::zero());
        assert!(matches!(
            pool.insert(overflow),
            Err(MempoolError::Capacity)
        ));
        assert_eq!(pool.len().unwrap(), 2);
    }

    #[test]
    fn removed_entries_are_skipped_on_pop() {
        let pool = pool();
        let entry = pool.prepare(legacy(0, 100, 21_000), Address::zero());
        let hash = entry.hash;
        pool.insert(entry).unwrap();
        pool.remove(&hash).unwrap();
        assert!(!pool.contains(&hash).unwrap());
        assert!(pool.pop_highest_priority().unwrap().is_none());
    }

    #[test]
    fn drain_respects_priority_and_caps() {
        let pool = pool();
        let expensive = pool.prepare(legacy(0, 100, 21_000), Address::zero());
        let cheap = pool.prepare(legacy(1, 50, 21_000), Address::zero());
        pool.insert(cheap.clone()).unwrap();
        pool.insert(expensive.clone()).unwrap();

        let drained = pool.drain_for_block(30_000_000, 1000).unwrap();
        assert_eq!(
            drained.iter().map(|e| e.hash).collect::<Vec<_>>(),
            vec![expensive.hash, cheap.hash]
        );
        assert!(pool.is_empty().unwrap());
    }

    #[test]
    fn drain_stops_at_gas_cap_and_keeps_the_rest() {
        let pool = pool();
        let first = pool.prepare(legacy(0, 100, 21_000), Address::zero());
        let second = pool.prepare(legacy(1, 90, 21_000), Address::zero());
        pool.insert(first.clone()).unwrap();
        pool.insert(second.clone()).unwrap();

        let drained = pool.drain_for_block(30_000, 1000).unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].hash, first.hash);
        // the one that did not fit is untouched
        assert!(pool.contains(&second.hash).unwrap());
        assert_eq!(pool.len().unwrap(), 1);
    }

    #[test]
    fn drain_respects_max_count() {
        let pool = pool();
        for nonce in 0..5 {
            pool.insert(pool.prepare(legacy(nonce, 10, 21_000), Address::zero()))
                .unwrap();
        }
        let drained = pool.drain_for_block(30_000_000, 3).unwrap();
        assert_eq!(drained.len(), 3);
        assert_eq!(pool.len().unwrap(), 2);
    }

    #[test]
    fn wal_replay_restores_pool() {
        let mut path = std::env::temp_dir();
        path.push(format!("seqrex-mempool-wal-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut tx = LegacyTransaction {
            nonce: 0,
            gas_price: U256::from(10),
            gas_limit: 21_000,
            ..Default::default()
        };
        tx.sign_inplace(&[0x11; 32], Some(1337)).unwrap();
        let tx = Transaction::Legacy(tx);
        let hash = tx.compute_hash();

        {
            let pool = Mempool::with_wal(100, &path).unwrap();
            let sender = match &tx {
                Transaction::Legacy(tx) => tx.recover_sender().unwrap(),
                _ => unreachable!(),
            };
            pool.insert(pool.prepare(tx.clone(), sender)).unwrap();
        }
        {
            let pool = Mempool::with_wal(100, &path).unwrap();
            assert_eq!(pool.len().unwrap(), 1);
            assert!(pool.contains(&hash).unwrap());
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn compaction_drops_drained_entries() {
        let mut path = std::env::temp_dir();
        path.push(format!("seqrex-mempool-compact-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut keep = LegacyTransaction {
            nonce: 1,
            gas_price: U256::from(1),
            gas_limit: 21_000,
            ..Default::default()
        };
        keep.sign_inplace(&[0x22; 32], Some(1337)).unwrap();
        let mut drop_tx = LegacyTransaction {
            nonce: 0,
            gas_price: U256::from(99),
            gas_limit: 21_000,
            ..Default::default()
        };
        drop_tx.sign_inplace(&[0x22; 32], Some(1337)).unwrap();

        {
            let pool = Mempool::with_wal(100, &path).unwrap();
            for tx in [keep.clone(), drop_tx.clone()] {
                let sender = tx.recover_sender().unwrap();
                pool.insert(pool.prepare(Transaction::Legacy(tx), sender))
                    .unwrap();
            }
            // the expensive one is drained into a block, then the WAL compacts
            let drained = pool.drain_for_block(30_000_000, 1).unwrap();
            assert_eq!(drained[0].hash, Transaction::Legacy(drop_tx).compute_hash());
            pool.compact_wal().unwrap();
        }
        {
            let pool = Mempool::with_wal(100, &path).unwrap();
            assert_eq!(pool.len().unwrap(), 1);
            assert!(
                pool.contains(&Transaction::Legacy(keep).compute_hash())
                    .unwrap()
            );
        }
        let _ = std::fs::remove_file(&path);
    }
}
