use bytes::Bytes;
use ethereum_types::{Address, H256};
use seqrex_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use serde::{Deserialize, Serialize};

use super::{BlockHash, BlockNumber};

/// Result of a transaction included in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: H256,
    pub block_number: BlockNumber,
    pub block_hash: BlockHash,
    pub tx_index: u64,
    pub gas_used: u64,
    pub succeeded: bool,
    pub logs: Vec<Log>,
}

impl RLPEncode for Receipt {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.tx_hash)
            .encode_field(&self.block_number)
            .encode_field(&self.block_hash)
            .encode_field(&self.tx_index)
            .encode_field(&self.gas_used)
            .encode_field(&self.succeeded)
            .encode_field(&self.logs)
            .finish();
    }
}

impl RLPDecode for Receipt {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (tx_hash, decoder) = decoder.decode_field("tx_hash")?;
        let (block_number, decoder) = decoder.decode_field("block_number")?;
        let (block_hash, decoder) = decoder.decode_field("block_hash")?;
        let (tx_index, decoder) = decoder.decode_field("tx_index")?;
        let (gas_used, decoder) = decoder.decode_field("gas_used")?;
        let (succeeded, decoder) = decoder.decode_field("succeeded")?;
        let (logs, decoder) = decoder.decode_field("logs")?;
        let receipt = Receipt {
            tx_hash,
            block_number,
            block_hash,
            tx_index,
            gas_used,
            succeeded,
            logs,
        };
        Ok((receipt, decoder.finish()?))
    }
}

/// Data record produced during the execution of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    #[serde(with = "crate::serde_utils::bytes")]
    pub data: Bytes,
}

impl RLPEncode for Log {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.address)
            .encode_field(&self.topics)
            .encode_field(&self.data)
            .finish();
    }
}

impl RLPDecode for Log {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (address, decoder) = decoder.decode_field("address")?;
        let (topics, decoder) = decoder.decode_field("topics")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let log = Log {
            address,
            topics,
            data,
        };
        Ok((log, decoder.finish()?))
    }
}
