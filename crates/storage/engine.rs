use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Mutex;

use crate::error::StoreError;

/// Opaque ordered byte-KV interface the store persists through.
///
/// A durable backend (rocksdb, mdbx, ...) plugs in here; the node ships with
/// the in-memory engine and treats durability as a deployment concern.
pub trait KvEngine: Debug + Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
    /// Key-ordered scan of all entries whose key starts with `prefix`.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryEngine {
    inner: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvEngine for InMemoryEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|err| StoreError::LockError(err.to_string()))?;
        Ok(inner.get(key).cloned())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|err| StoreError::LockError(err.to_string()))?;
        inner.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|err| StoreError::LockError(err.to_string()))?;
        inner.remove(key);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|err| StoreError::LockError(err.to_string()))?;
        Ok(inner
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
