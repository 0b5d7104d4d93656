mod batch;
mod block;
mod receipt;
mod transaction;
mod witness;

pub use batch::Batch;
pub use block::{Block, BlockBody, BlockHeader, BlockHash, BlockNumber};
pub use receipt::{Log, Receipt};
pub use transaction::{
    ExecuteTransaction, LegacyTransaction, MempoolTransaction, SignatureComponents,
    SignatureError, Transaction, TxKind, TxType,
};
pub use witness::ExecutionWitness;
