mod execution_witness;

pub use execution_witness::{GenerateBlockWitnessRequest, GenerateWitnessRequest};

use serde_json::Value;

use crate::context::RpcApiContext;
use crate::router::RpcHandler;
use crate::rpc_types::{RpcErr, RpcRequest};

pub async fn map_debug_requests(req: &RpcRequest, context: RpcApiContext) -> Result<Value, RpcErr> {
    match req.method.as_str() {
        "debug_generateWitness" => GenerateWitnessRequest::call(req, context).await,
        "debug_generateBlockWitness" => GenerateBlockWitnessRequest::call(req, context).await,
        unknown => Err(RpcErr::MethodNotFound(unknown.to_string())),
    }
}
