use std::sync::Mutex;

use ethereum_types::H256;
use seqrex_common::types::BlockHeader;

use crate::error::ChainError;

/// The four chain pointers the sequencer tracks.
///
/// `finalized ≤ safe ≤ head` by block number; `unsafe_` may run ahead of
/// `head` while the sequencer has proposed past L1 derivation. Parent-hash
/// continuity is not enforced here; the reorg detector is authoritative.
#[derive(Debug, Clone, Default)]
pub struct ChainHead {
    pub head: Option<BlockHeader>,
    pub safe: Option<BlockHeader>,
    pub unsafe_: Option<BlockHeader>,
    pub finalized: Option<BlockHeader>,
}

#[derive(Debug, Default)]
pub struct ChainHeadTracker {
    inner: Mutex<ChainHead>,
}

impl ChainHeadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_head(&self, header: Option<BlockHeader>) -> Result<(), ChainError> {
        self.lock()?.head = header;
        Ok(())
    }

    pub fn set_safe(&self, header: Option<BlockHeader>) -> Result<(), ChainError> {
        self.lock()?.safe = header;
        Ok(())
    }

    pub fn set_unsafe(&self, header: Option<BlockHeader>) -> Result<(), ChainError> {
        self.lock()?.unsafe_ = header;
        Ok(())
    }

    pub fn set_finalized(&self, header: Option<BlockHeader>) -> Result<(), ChainError> {
        self.lock()?.finalized = header;
        Ok(())
    }

    /// Shallow copy of all four pointers.
    pub fn snapshot(&self) -> Result<ChainHead, ChainError> {
        Ok(self.lock()?.clone())
    }

    pub fn head_hash(&self) -> Result<Option<H256>, ChainError> {
        Ok(self.lock()?.head.as_ref().map(BlockHeader::hash))
    }

    pub fn safe_hash(&self) -> Result<Option<H256>, ChainError> {
        Ok(self.lock()?.safe.as_ref().map(BlockHeader::hash))
    }

    pub fn unsafe_hash(&self) -> Result<Option<H256>, ChainError> {
        Ok(self.lock()?.unsafe_.as_ref().map(BlockHeader::hash))
    }

    pub fn finalized_hash(&self) -> Result<Option<H256>, ChainError> {
        Ok(self.lock()?.finalized.as_ref().map(BlockHeader::hash))
    }

    /// Clamps every pointer ahead of `number` back to the given header.
    pub fn truncate_ahead_of(
        &self,
        number: u64,
        replacement: Option<BlockHeader>,
    ) -> Result<(), ChainError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        for pointer in [
            &mut inner.head,
            &mut inner.safe,
            &mut inner.unsafe_,
            &mut inner.finalized,
        ] {
            if pointer.as_ref().is_some_and(|header| header.number > number) {
                *pointer = replacement.clone();
            }
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ChainHead>, ChainError> {
        self.inner
            .lock()
            .map_err(|err| ChainError::Custom(format!("chain head lock poisoned: {err}")))
    }
}
