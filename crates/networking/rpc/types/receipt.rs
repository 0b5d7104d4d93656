use ethereum_types::{H256, U256};
use seqrex_common::types::{Log, Receipt};
use serde::Serialize;

/// Receipt as served over `eth_getTransactionReceipt`: quantities as
/// 0x-prefixed hex, status as 0x0/0x1.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: H256,
    #[serde(with = "seqrex_common::serde_utils::u64::hex_str")]
    pub block_number: u64,
    pub block_hash: H256,
    #[serde(with = "seqrex_common::serde_utils::u64::hex_str")]
    pub transaction_index: u64,
    #[serde(with = "seqrex_common::serde_utils::u64::hex_str")]
    pub gas_used: u64,
    #[serde(with = "seqrex_common::serde_utils::u256::hex_str")]
    pub status: U256,
    pub logs: Vec<RpcLog>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: ethereum_types::Address,
    pub topics: Vec<H256>,
    #[serde(with = "seqrex_common::serde_utils::bytes")]
    pub data: bytes::Bytes,
}

impl From<Receipt> for RpcReceipt {
    fn from(receipt: Receipt) -> Self {
        Self {
            transaction_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            block_hash: receipt.block_hash,
            transaction_index: receipt.tx_index,
            gas_used: receipt.gas_used,
            status: U256::from(u8::from(receipt.succeeded)),
            logs: receipt.logs.into_iter().map(RpcLog::from).collect(),
        }
    }
}

impl From<Log> for RpcLog {
    fn from(log: Log) -> Self {
        Self {
            address: log.address,
            topics: log.topics,
            data: log.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_serializes_as_hex_quantities() {
        let receipt = Receipt {
            tx_hash: H256::repeat_byte(0x01),
            block_number: 16,
            block_hash: H256::repeat_byte(0x02),
            tx_index: 0,
            gas_used: 21_000,
            succeeded: true,
            logs: vec![],
        };
        let value = serde_json::to_value(RpcReceipt::from(receipt)).unwrap();
        assert_eq!(value["blockNumber"], "0x10");
        assert_eq!(value["gasUsed"], "0x5208");
        assert_eq!(value["status"], "0x1");
        assert_eq!(value["transactionIndex"], "0x0");
    }
}
