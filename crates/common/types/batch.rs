use ethereum_types::H256;
use seqrex_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use super::{Block, ExecuteTransaction};

/// A sealed run of blocks awaiting (or acknowledged by) L1 submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub blocks: Vec<Block>,
    /// Opaque 0x7e envelopes riding along for L1 forwarding.
    pub forwarded: Vec<ExecuteTransaction>,
    pub l1_tx_hash: Option<H256>,
    pub l1_block_number: Option<u64>,
    /// Seal time, seconds since the epoch.
    pub created_at: u64,
}

impl Batch {
    pub fn first_block(&self) -> Option<u64> {
        self.blocks.first().map(|block| block.header.number)
    }

    pub fn last_block(&self) -> Option<u64> {
        self.blocks.last().map(|block| block.header.number)
    }
}

impl RLPEncode for Batch {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        let forwarded: Vec<bytes::Bytes> = self
            .forwarded
            .iter()
            .map(|tx| tx.payload.clone())
            .collect();
        Encoder::new(buf)
            .encode_field(&self.blocks)
            .encode_field(&forwarded)
            .encode_field(&self.l1_tx_hash.unwrap_or_default())
            .encode_field(&self.l1_block_number.unwrap_or_default())
            .encode_field(&self.created_at)
            .finish();
    }
}

impl RLPDecode for Batch {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (blocks, decoder) = decoder.decode_field("blocks")?;
        let (forwarded, decoder): (Vec<bytes::Bytes>, _) = decoder.decode_field("forwarded")?;
        let (l1_tx_hash, decoder): (H256, _) = decoder.decode_field("l1_tx_hash")?;
        let (l1_block_number, decoder): (u64, _) = decoder.decode_field("l1_block_number")?;
        let (created_at, decoder) = decoder.decode_field("created_at")?;
        let batch = Batch {
            blocks,
            forwarded: forwarded
                .into_iter()
                .map(|payload| ExecuteTransaction { payload })
                .collect(),
            l1_tx_hash: (!l1_tx_hash.is_zero()).then_some(l1_tx_hash),
            l1_block_number: (l1_block_number != 0).then_some(l1_block_number),
            created_at,
        };
        Ok((batch, decoder.finish()?))
    }
}
