use seqrex_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to decode stored value")]
    DecodeError,
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Failed to lock store: {0}")]
    LockError(String),
    #[error("{0}")]
    Custom(String),
}
