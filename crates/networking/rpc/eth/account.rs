use ethereum_types::Address;
use serde_json::Value;

use crate::context::RpcApiContext;
use crate::router::RpcHandler;
use crate::rpc_types::RpcErr;

/// Both account reads take `[address, block_identifier]`; only the latest
/// state is tracked, so the block identifier is accepted and ignored.
fn parse_address(params: &Option<Vec<Value>>) -> Result<Address, RpcErr> {
    let params = params
        .as_ref()
        .ok_or(RpcErr::MissingParam("address".to_string()))?;
    if params.is_empty() || params.len() > 2 {
        return Err(RpcErr::BadParams("expected 1 or 2 params".to_string()));
    }
    Ok(serde_json::from_value(params[0].clone())?)
}

pub struct GetBalanceRequest {
    pub address: Address,
}

impl RpcHandler for GetBalanceRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        Ok(Self {
            address: parse_address(params)?,
        })
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        let balance = context.blockchain.store.get_balance(&self.address)?;
        Ok(Value::String(format!("{balance:#x}")))
    }
}

pub struct GetTransactionCountRequest {
    pub address: Address,
}

impl RpcHandler for GetTransactionCountRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        Ok(Self {
            address: parse_address(params)?,
        })
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        let nonce = context.blockchain.store.get_nonce(&self.address)?;
        Ok(Value::String(format!("{nonce:#x}")))
    }
}
