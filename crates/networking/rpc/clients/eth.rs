use std::sync::atomic::{AtomicU64, Ordering};

use ethereum_types::H256;
use seqrex_common::types::Batch;
use seqrex_rlp::encode::RLPEncode;
use serde_json::{Value, json};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum EthClientError {
    #[error("L1 unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
    #[error("L1 RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Failed to parse L1 response: {0}")]
    ParseError(String),
}

/// JSON-RPC client for the L1 endpoint.
///
/// The client is one-shot; retry and backoff live in the sequencer loops
/// that drive it.
#[derive(Debug)]
pub struct EthClient {
    client: reqwest::Client,
    url: Url,
    request_id: AtomicU64,
}

impl EthClient {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            request_id: AtomicU64::new(1),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, EthClientError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        let response: Value = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(EthClientError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| EthClientError::ParseError("response without result".to_string()))
    }

    pub async fn get_block_number(&self) -> Result<u64, EthClientError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        parse_hex_u64(&result)
    }

    /// Hash of the L1 block at `number`; `None` when the block does not
    /// exist (yet) on the queried node.
    pub async fn get_block_hash(&self, number: u64) -> Result<Option<H256>, EthClientError> {
        let result = self
            .request(
                "eth_getBlockByNumber",
                json!([format!("{number:#x}"), false]),
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let hash = result
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| EthClientError::ParseError("block without hash".to_string()))?;
        parse_h256(hash).map(Some)
    }

    /// Submits a sealed batch, carried as its RLP encoding in a raw
    /// transaction. Returns the L1 transaction hash acknowledged by the node.
    pub async fn submit_batch(&self, batch: &Batch) -> Result<H256, EthClientError> {
        let payload = format!("0x{}", hex::encode(batch.encode_to_vec()));
        let result = self
            .request("eth_sendRawTransaction", json!([payload]))
            .await?;
        let hash = result
            .as_str()
            .ok_or_else(|| EthClientError::ParseError("expected a tx hash".to_string()))?;
        parse_h256(hash)
    }
}

fn parse_hex_u64(value: &Value) -> Result<u64, EthClientError> {
    let hex_str = value
        .as_str()
        .ok_or_else(|| EthClientError::ParseError("expected a hex string".to_string()))?;
    u64::from_str_radix(hex_str.trim_start_matches("0x"), 16)
        .map_err(|err| EthClientError::ParseError(err.to_string()))
}

fn parse_h256(hex_str: &str) -> Result<H256, EthClientError> {
    let bytes = hex::decode(hex_str.trim_start_matches("0x"))
        .map_err(|err| EthClientError::ParseError(err.to_string()))?;
    if bytes.len() != 32 {
        return Err(EthClientError::ParseError(format!(
            "expected 32 hash bytes, got {}",
            bytes.len()
        )));
    }
    Ok(H256::from_slice(&bytes))
}
