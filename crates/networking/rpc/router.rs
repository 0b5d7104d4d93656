use serde_json::Value;

use crate::context::RpcApiContext;
use crate::rpc_types::{RpcErr, RpcNamespace, RpcRequest};

pub trait RpcHandler: Sized {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr>;

    async fn call(req: &RpcRequest, context: RpcApiContext) -> Result<Value, RpcErr> {
        let request = Self::parse(&req.params)?;
        request.handle(context).await
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr>;
}

/// Routes one request to its namespace.
pub async fn map_http_requests(
    req: &RpcRequest,
    context: RpcApiContext,
) -> Result<Value, RpcErr> {
    match req.namespace() {
        Ok(RpcNamespace::Eth) => crate::eth::map_eth_requests(req, context).await,
        Ok(RpcNamespace::Debug) => crate::debug::map_debug_requests(req, context).await,
        Err(err) => Err(err),
    }
}
