use ethereum_types::H256;
use seqrex_common::types::Transaction;
use serde_json::Value;
use tracing::info;

use crate::context::RpcApiContext;
use crate::eth::parse_hex_bytes;
use crate::router::RpcHandler;
use crate::rpc_types::RpcErr;
use crate::types::RpcReceipt;

pub struct SendRawTransactionRequest {
    pub transaction: Transaction,
}

impl RpcHandler for SendRawTransactionRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        let params = params
            .as_ref()
            .ok_or(RpcErr::MissingParam("raw transaction".to_string()))?;
        if params.len() != 1 {
            return Err(RpcErr::BadParams("expected 1 param".to_string()));
        }
        let bytes = parse_hex_bytes(&params[0])?;
        let transaction = Transaction::decode_canonical(&bytes)
            .map_err(|err| RpcErr::BadParams(format!("transaction decode error: {err}")))?;
        Ok(Self { transaction })
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        let hash = context
            .blockchain
            .add_transaction(self.transaction.clone())?;
        info!("Accepted raw transaction {hash:#x}");
        Ok(Value::String(format!("{hash:#x}")))
    }
}

pub struct GetTransactionReceiptRequest {
    pub tx_hash: H256,
}

impl RpcHandler for GetTransactionReceiptRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        let params = params
            .as_ref()
            .ok_or(RpcErr::MissingParam("transaction hash".to_string()))?;
        if params.len() != 1 {
            return Err(RpcErr::BadParams("expected 1 param".to_string()));
        }
        Ok(Self {
            tx_hash: serde_json::from_value(params[0].clone())?,
        })
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        match context.blockchain.store.get_receipt(&self.tx_hash)? {
            Some(receipt) => Ok(serde_json::to_value(RpcReceipt::from(receipt))
                .map_err(|err| RpcErr::Internal(err.to_string()))?),
            None => Ok(Value::Null),
        }
    }
}
