use bytes::Bytes;
use ethereum_types::H256;
use seqrex_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use super::BlockHeader;

/// Everything an execution touched, sufficient to re-execute it statelessly:
/// the hashes of the state trie nodes read, the bytecode fetched, and the
/// block headers consulted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionWitness {
    pub state_nodes: Vec<H256>,
    pub codes: Vec<(H256, Bytes)>,
    pub block_headers: Vec<BlockHeader>,
}

impl ExecutionWitness {
    pub fn is_empty(&self) -> bool {
        self.state_nodes.is_empty() && self.codes.is_empty() && self.block_headers.is_empty()
    }
}

impl RLPEncode for ExecutionWitness {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.state_nodes)
            .encode_field(&self.codes)
            .encode_field(&self.block_headers)
            .finish();
    }
}

impl RLPDecode for ExecutionWitness {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (state_nodes, decoder) = decoder.decode_field("state_nodes")?;
        let (codes, decoder) = decoder.decode_field("codes")?;
        let (block_headers, decoder) = decoder.decode_field("block_headers")?;
        let witness = ExecutionWitness {
            state_nodes,
            codes,
            block_headers,
        };
        Ok((witness, decoder.finish()?))
    }
}
