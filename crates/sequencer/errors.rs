use seqrex_blockchain::error::{ChainError, MempoolError};
use seqrex_rpc::clients::EthClientError;
use seqrex_storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Mempool error: {0}")]
    Mempool(#[from] MempoolError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("L1 client error: {0}")]
    L1Client(#[from] EthClientError),
    #[error("{0}")]
    Custom(String),
}
