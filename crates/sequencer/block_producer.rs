use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use seqrex_blockchain::Blockchain;
use seqrex_common::types::Batch;
use seqrex_rpc::clients::EthClient;
use tracing::{debug, error, info, warn};

use crate::errors::SequencerError;

/// Drives block production and batch submission.
///
/// Each tick: build a block from the mempool (unless halted), seal the batch
/// when due, and push it to L1. A batch that fails to submit stays pending
/// and is retried on the next tick before any new batch is sealed.
pub struct BlockProducer {
    blockchain: Arc<Blockchain>,
    l1_client: Arc<EthClient>,
    block_time_ms: u64,
    emergency_halt: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    pending_batch: Option<Batch>,
}

impl BlockProducer {
    pub fn new(
        blockchain: Arc<Blockchain>,
        l1_client: Arc<EthClient>,
        block_time_ms: u64,
        emergency_halt: Arc<AtomicBool>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            blockchain,
            l1_client,
            block_time_ms,
            emergency_halt,
            shutdown,
            pending_batch: None,
        }
    }

    /// Loop until the shutdown flag is raised.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.block_time_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Block producer shutting down");
                return;
            }
            if let Err(err) = self.tick().await {
                error!("Block producer error: {err}");
            }
        }
    }

    async fn tick(&mut self) -> Result<(), SequencerError> {
        if self.emergency_halt.load(Ordering::Relaxed) {
            debug!("Emergency halt active, skipping block production");
            return Ok(());
        }

        // retry a batch left over from a failed submission first
        if let Some(batch) = self.pending_batch.take() {
            self.submit_batch(batch).await;
        }

        if let Some(block) = self.blockchain.build_block()? {
            debug!(
                number = block.header.number,
                transactions = block.body.transactions.len(),
                "Produced block"
            );
        }

        if self.pending_batch.is_none() {
            if let Some(batch) = self.blockchain.maybe_seal_batch()? {
                self.submit_batch(batch).await;
            }
        }
        Ok(())
    }

    async fn submit_batch(&mut self, mut batch: Batch) {
        match self.l1_client.submit_batch(&batch).await {
            Ok(l1_tx_hash) => {
                batch.l1_tx_hash = Some(l1_tx_hash);
                info!(
                    blocks = batch.blocks.len(),
                    l1_tx_hash = %format!("{l1_tx_hash:#x}"),
                    "Batch submitted to L1"
                );
                if let Err(err) = self.blockchain.on_batch_submitted(&batch) {
                    error!("Failed to account submitted batch: {err}");
                }
            }
            Err(err) => {
                // the batch stays pending; next tick retries
                warn!("Batch submission failed, will retry: {err}");
                self.pending_batch = Some(batch);
            }
        }
    }
}
