use std::sync::Arc;

use seqrex_blockchain::Blockchain;

/// Shared handles threaded into every RPC handler.
#[derive(Clone)]
pub struct RpcApiContext {
    pub blockchain: Arc<Blockchain>,
}

impl RpcApiContext {
    pub fn new(blockchain: Arc<Blockchain>) -> Self {
        Self { blockchain }
    }
}
