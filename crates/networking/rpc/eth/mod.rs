mod account;
mod block;
mod transaction;

pub use account::{GetBalanceRequest, GetTransactionCountRequest};
pub use block::{BlockNumberRequest, ChainIdRequest};
pub use transaction::{GetTransactionReceiptRequest, SendRawTransactionRequest};

use serde_json::Value;

use crate::context::RpcApiContext;
use crate::router::RpcHandler;
use crate::rpc_types::{RpcErr, RpcRequest};

pub async fn map_eth_requests(req: &RpcRequest, context: RpcApiContext) -> Result<Value, RpcErr> {
    match req.method.as_str() {
        "eth_sendRawTransaction" => SendRawTransactionRequest::call(req, context).await,
        "eth_getTransactionReceipt" => GetTransactionReceiptRequest::call(req, context).await,
        "eth_blockNumber" => BlockNumberRequest::call(req, context).await,
        "eth_chainId" => ChainIdRequest::call(req, context).await,
        "eth_getBalance" => GetBalanceRequest::call(req, context).await,
        "eth_getTransactionCount" => GetTransactionCountRequest::call(req, context).await,
        unknown => Err(RpcErr::MethodNotFound(unknown.to_string())),
    }
}

/// Decodes a 0x-prefixed hex parameter into raw bytes.
pub(crate) fn parse_hex_bytes(value: &Value) -> Result<Vec<u8>, RpcErr> {
    let Value::String(hex_str) = value else {
        return Err(RpcErr::BadParams("expected a hex string".to_string()));
    };
    hex::decode(hex_str.trim_start_matches("0x"))
        .map_err(|err| RpcErr::BadParams(format!("invalid hex: {err}")))
}
