//! Long-lived sequencer workers: the block producer, the L1 watcher and the
//! WAL compactor, plus the environment-driven configuration they share.
//! Shutdown is cooperative: every loop checks a shared atomic flag at its
//! head and winds down on the next tick.

pub mod block_producer;
pub mod configs;
pub mod errors;
pub mod l1_watcher;
pub mod wal_compactor;

pub use configs::SequencerConfig;
pub use errors::SequencerError;
