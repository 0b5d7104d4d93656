use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use seqrex_blockchain::Blockchain;
use tracing::{debug, info, warn};

/// Periodic safety net for WAL compaction.
///
/// The producer already compacts after every acknowledged batch; this loop
/// covers long stretches without submissions (L1 outages, emergency halt)
/// so the log cannot grow without bound.
pub struct WalCompactor {
    blockchain: Arc<Blockchain>,
    interval_ms: u64,
    shutdown: Arc<AtomicBool>,
}

impl WalCompactor {
    pub fn new(blockchain: Arc<Blockchain>, interval_ms: u64, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            blockchain,
            interval_ms,
            shutdown,
        }
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                info!("WAL compactor shutting down");
                return;
            }
            match self.blockchain.mempool.compact_wal() {
                Ok(()) => debug!("Compacted mempool WAL"),
                Err(err) => warn!("WAL compaction failed: {err}"),
            }
        }
    }
}
