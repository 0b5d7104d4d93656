use seqrex_blockchain::execution::execute_transaction;
use seqrex_blockchain::witness::{WitnessBuilder, generate_block_witness};
use seqrex_common::types::Transaction;
use seqrex_rlp::encode::RLPEncode;
use serde_json::{Value, json};
use tracing::info;

use crate::context::RpcApiContext;
use crate::eth::parse_hex_bytes;
use crate::router::RpcHandler;
use crate::rpc_types::RpcErr;

/// `debug_generateWitness(raw_tx_hex)`: executes one transaction against a
/// forked copy of the latest state and returns the witness it accumulated.
pub struct GenerateWitnessRequest {
    pub transaction: Transaction,
}

impl RpcHandler for GenerateWitnessRequest {
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
        let Transaction::Legacy(ref tx) = self.transaction else {
            return Err(RpcErr::BadParams(
                "witness generation requires an executable transaction".to_string(),
            ));
        };
        let sender = tx
            .recover_sender()
            .map_err(|err| RpcErr::BadParams(err.to_string()))?;

        let fork = context.blockchain.store.fork()?;
        let mut builder = WitnessBuilder::new();
        execute_transaction(tx, sender, &fork, Some(&mut builder))?;
        let witness = builder.build(None);

        let encoded = witness.encode_to_vec();
        Ok(json!({
            "witness": format!("0x{}", hex::encode(&encoded)),
            "witnessSize": encoded.len(),
        }))
    }
}

/// `debug_generateBlockWitness(block_number | "latest")`: re-executes a
/// persisted block and returns (and persists) its witness. "latest" always
/// resolves to the latest sealed block, never to a fresh build.
pub struct GenerateBlockWitnessRequest {
    pub block_number: Option<u64>,
}

impl RpcHandler for GenerateBlockWitnessRequest {
    fn parse(params: &Option<Vec<Value>>) -> Result<Self, RpcErr> {
        let params = params
            .as_ref()
            .ok_or(RpcErr::MissingParam("block number".to_string()))?;
        if params.len() != 1 {
            return Err(RpcErr::BadParams("expected 1 param".to_string()));
        }
        let block_number = match &params[0] {
            Value::String(tag) if tag == "latest" => None,
            Value::String(hex_str) => Some(
                u64::from_str_radix(hex_str.trim_start_matches("0x"), 16)
                    .map_err(|_| RpcErr::BadParams(format!("invalid block number {hex_str}")))?,
            ),
            Value::Number(number) => Some(
                number
                    .as_u64()
                    .ok_or(RpcErr::BadParams("invalid block number".to_string()))?,
            ),
            other => {
                return Err(RpcErr::BadParams(format!(
                    "invalid block identifier {other}"
                )));
            }
        };
        Ok(Self { block_number })
    }

    async fn handle(&self, context: RpcApiContext) -> Result<Value, RpcErr> {
        let store = &context.blockchain.store;
        let block_number = match self.block_number {
            Some(number) => number,
            None => store.get_block_number()?,
        };
        let Some(block) = store.get_block(block_number)? else {
            return Err(RpcErr::BadParams(format!(
                "unknown block {block_number}"
            )));
        };

        let witness = generate_block_witness(&block, store)?;
        store.put_witness(block.hash(), &witness)?;
        info!(block_number, "Generated block witness");

        let encoded = witness.encode_to_vec();
        Ok(json!({
            "witness": format!("0x{}", hex::encode(&encoded)),
            "witnessSize": encoded.len(),
            "blockNumber": block_number,
            "transactionCount": block.body.transactions.len(),
        }))
    }
}
