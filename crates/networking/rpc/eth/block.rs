use serde_json::Value;

use crate::context::RpcApiContext;
use crate::router::RpcHandler;
use crate::rpc_types::RpcErr;

pub struct BlockNumberRequest;

impl RpcHandler for BlockNumberRequest {
    fn parse(_params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        Ok(Self)
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        let number = context.blockchain.store.get_block_number()?;
        Ok(Value::String(format!("{number:#x}")))
    }
}

pub struct ChainIdRequest;

impl RpcHandler for ChainIdRequest {
    fn parse(_params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        Ok(Self)
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        let chain_id = context.blockchain.options().chain_id;
        Ok(Value::String(format!("{chain_id:#x}")))
    }
}
