use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use seqrex_blockchain::Blockchain;
use seqrex_blockchain::reorg::ReorgDetector;
use seqrex_rpc::clients::EthClient;
use tracing::{debug, error, info, warn};

use crate::errors::SequencerError;

/// Polls the L1 chain head and watches both chains for reorgs.
///
/// L1 divergence orphans whatever safety the submitted batches had, so the
/// safe and finalized pointers are cleared. L2 divergence (the local head
/// moving off the recorded chain) rolls the sequencer back to the common
/// ancestor and discards in-flight batches.
pub struct L1Watcher {
    blockchain: Arc<Blockchain>,
    l1_client: Arc<EthClient>,
    check_interval_ms: u64,
    shutdown: Arc<AtomicBool>,
    l1_detector: ReorgDetector,
    l2_detector: ReorgDetector,
}

impl L1Watcher {
    pub fn new(
        blockchain: Arc<Blockchain>,
        l1_client: Arc<EthClient>,
        check_interval_ms: u64,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            blockchain,
            l1_client,
            check_interval_ms,
            shutdown,
            l1_detector: ReorgDetector::new(),
            l2_detector: ReorgDetector::new(),
        }
    }

    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.check_interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                info!("L1 watcher shutting down");
                return;
            }
            if let Err(err) = self.watch_l1().await {
                warn!("L1 watcher error: {err}");
            }
            if let Err(err) = self.watch_l2() {
                error!("L2 head watcher error: {err}");
            }
        }
    }

    async fn watch_l1(&mut self) -> Result<(), SequencerError> {
        let number = self.l1_client.get_block_number().await?;
        let Some(hash) = self.l1_client.get_block_hash(number).await? else {
            debug!(number, "L1 block not yet available");
            return Ok(());
        };

        if let Some(common_ancestor) = self.l1_detector.on_block(number, hash) {
            warn!(number, common_ancestor, "L1 reorg detected");
            // batches acknowledged on the orphaned branch are unsafe again
            self.blockchain.head_tracker.set_safe(None)?;
            self.blockchain.head_tracker.set_finalized(None)?;
        }
        Ok(())
    }

    fn watch_l2(&mut self) -> Result<(), SequencerError> {
        let Some(head) = self.blockchain.head_tracker.snapshot()?.head else {
            return Ok(());
        };
        if let Some(common_ancestor) = self.l2_detector.on_block(head.number, head.hash()) {
            warn!(
                number = head.number,
                common_ancestor, "L2 head diverged from recorded chain"
            );
            self.blockchain.handle_l2_reorg(common_ancestor)?;
        }
        Ok(())
    }
}
