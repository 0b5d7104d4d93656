use ethereum_types::H256;
use seqrex_common::types::SignatureError;
use seqrex_rlp::error::RLPDecodeError;
use seqrex_storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum MempoolError {
    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("Nonce for account too low: expected at least {expected}, got {got}")]
    NonceTooLow { expected: u64, got: u64 },
    #[error("Account does not have enough balance to cover the tx cost")]
    NotEnoughBalance,
    #[error("Transaction gas limit exceeds the block gas limit")]
    GasLimitExceeded,
    #[error("Transaction already known: {0:#x}")]
    DuplicateTransaction(H256),
    #[error("Mempool is full")]
    Capacity,
    #[error("Transaction decode error: {0}")]
    RLPDecode(#[from] RLPDecodeError),
    #[error("DB error: {0}")]
    StoreError(#[from] StoreError),
    #[error("WAL error: {0}")]
    Wal(#[from] std::io::Error),
    #[error("Failed to lock mempool: {0}")]
    LockError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("DB error: {0}")]
    StoreError(#[from] StoreError),
    #[error("RLP decode error: {0}")]
    RLPDecodeError(#[from] RLPDecodeError),
    #[error("Mempool error: {0}")]
    MempoolError(#[from] MempoolError),
    #[error("Failed to generate witness: {0}")]
    WitnessGeneration(String),
    #[error("{0}")]
    Custom(String),
}
