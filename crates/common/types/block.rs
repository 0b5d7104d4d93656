use ethereum_types::{Bloom, H256};
use seqrex_crypto::keccak_hash_h256;
use seqrex_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use super::Transaction;

pub type BlockNumber = u64;
pub type BlockHash = H256;

/// Header of a sealed block. Immutable once the block is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockHeader {
    pub parent_hash: BlockHash,
    pub number: BlockNumber,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub state_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
}

impl BlockHeader {
    /// Block id: keccak of the header encoding.
    pub fn hash(&self) -> BlockHash {
        keccak_hash_h256(self.encode_to_vec())
    }
}

impl RLPEncode for BlockHeader {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.parent_hash)
            .encode_field(&self.number)
            .encode_field(&self.timestamp)
            .encode_field(&self.gas_limit)
            .encode_field(&self.gas_used)
            .encode_field(&self.state_root)
            .encode_field(&self.receipts_root)
            .encode_field(&self.logs_bloom)
            .finish();
    }
}

impl RLPDecode for BlockHeader {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (parent_hash, decoder) = decoder.decode_field("parent_hash")?;
        let (number, decoder) = decoder.decode_field("number")?;
        let (timestamp, decoder) = decoder.decode_field("timestamp")?;
        let (gas_limit, decoder) = decoder.decode_field("gas_limit")?;
        let (gas_used, decoder) = decoder.decode_field("gas_used")?;
        let (state_root, decoder) = decoder.decode_field("state_root")?;
        let (receipts_root, decoder) = decoder.decode_field("receipts_root")?;
        let (logs_bloom, decoder) = decoder.decode_field("logs_bloom")?;
        let header = BlockHeader {
            parent_hash,
            number,
            timestamp,
            gas_limit,
            gas_used,
            state_root,
            receipts_root,
            logs_bloom,
        };
        Ok((header, decoder.finish()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
}

impl RLPEncode for BlockBody {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        let encoded_txs: Vec<Vec<u8>> = self
            .transactions
            .iter()
            .map(Transaction::encode_canonical_to_vec)
            .collect();
        let mut encoder = Encoder::new(buf);
        for tx in &encoded_txs {
            // typed envelopes nest as byte strings, legacy lists stay raw
            if tx.first().is_some_and(|b| *b < 0xc0) {
                encoder = encoder.encode_bytes(tx);
            } else {
                encoder = encoder.encode_raw(tx);
            }
        }
        encoder.finish();
    }
}

impl RLPDecode for BlockBody {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let mut transactions = Vec::new();
        while !decoder.is_done() {
            let (item, rest) = decoder.get_encoded_item()?;
            decoder = rest;
            // typed envelopes arrive wrapped as byte strings
            let tx = if item.first().is_some_and(|b| *b < 0xc0) {
                let (payload, _) = seqrex_rlp::decode::decode_bytes(&item)?;
                Transaction::decode_canonical(payload)?
            } else {
                Transaction::decode_canonical(&item)?
            };
            transactions.push(tx);
        }
        Ok((BlockBody { transactions }, decoder.finish()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }
}

impl RLPEncode for Block {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.header)
            .encode_field(&self.body)
            .finish();
    }
}

impl RLPDecode for Block {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (header, decoder) = decoder.decode_field("header")?;
        let (body, decoder) = decoder.decode_field("body")?;
        Ok((Block { header, body }, decoder.finish()?))
    }
}
