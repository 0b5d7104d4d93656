use seqrex_common::types::{Batch, Block, ExecuteTransaction};

/// Accumulates sealed blocks (and opaque envelopes awaiting forwarding)
/// until the batch is due for L1 submission.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    blocks: Vec<Block>,
    forwarded: Vec<ExecuteTransaction>,
    /// Milliseconds timestamp of the first block added since the last seal.
    started_at_ms: Option<u64>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, block: Block, now_ms: u64) {
        if self.blocks.is_empty() {
            self.started_at_ms = Some(now_ms);
        }
        self.blocks.push(block);
    }

    pub fn add_forwarded(&mut self, tx: ExecuteTransaction) {
        self.forwarded.push(tx);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Seal when the block cap is reached or the batch interval elapsed.
    pub fn should_seal(&self, now_ms: u64, max_blocks: usize, interval_ms: u64) -> bool {
        if self.blocks.is_empty() {
            return false;
        }
        if self.blocks.len() >= max_blocks {
            return true;
        }
        self.started_at_ms
            .is_some_and(|started| now_ms.saturating_sub(started) >= interval_ms)
    }

    /// Drains the builder into a batch stamped with the seal time.
    pub fn seal(&mut self, now_seconds: u64) -> Batch {
        self.started_at_ms = None;
        Batch {
            blocks: std::mem::take(&mut self.blocks),
            forwarded: std::mem::take(&mut self.forwarded),
            l1_tx_hash: None,
            l1_block_number: None,
            created_at: now_seconds,
        }
    }

    /// Drops everything in flight, e.g. after an L2 reorg.
    pub fn discard(&mut self) {
        self.blocks.clear();
        self.forwarded.clear();
        self.started_at_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqrex_common::types::BlockHeader;

    fn block(number: u64) -> Block {
        Block {
            header: BlockHeader {
                number,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn seals_on_block_cap() {
        let mut builder = BatchBuilder::new();
        builder.add_block(block(1), 0);
        assert!(!builder.should_seal(0, 2, 1_000));
        builder.add_block(block(2), 10);
        assert!(builder.should_seal(10, 2, 1_000));

        let batch = builder.seal(99);
        assert_eq!(batch.blocks.len(), 2);
        assert_eq!(batch.created_at, 99);
        assert_eq!(batch.first_block(), Some(1));
        assert_eq!(batch.last_block(), Some(2));
        assert!(builder.is_empty());
    }

    #[test]
    fn seals_on_elapsed_interval() {
        let mut builder = BatchBuilder::new();
        builder.add_block(block(1), 1_000);
        assert!(!builder.should_seal(1_500, 1_000, 2_000));
        assert!(builder.should_seal(3_000, 1_000, 2_000));
    }

    #[test]
    fn empty_builder_never_seals() {
        let builder = BatchBuilder::new();
        assert!(!builder.should_seal(u64::MAX, 1, 0));
    }

    #[test]
    fn discard_clears_in_flight_work() {
        let mut builder = BatchBuilder::new();
        builder.add_block(block(1), 0);
        builder.discard();
        assert!(builder.is_empty());
        assert!(!builder.should_seal(u64::MAX, 1, 0));
    }
}
