use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use seqrex_crypto::{
    EcdsaError, keccak_hash_h256, public_to_address, recover_public, sign_hash,
};
use seqrex_rlp::{
    decode::{RLPDecode, decode_rlp_item},
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use thiserror::Error;

use crate::constants::EXECUTE_TX_TYPE;

/// Order of the secp256k1 curve, upper bound for valid `r` and `s`.
pub const SECP256K1_ORDER: U256 = U256([
    0xbfd25e8cd0364141,
    0xbaaedce6af48a03b,
    0xfffffffffffffffe,
    0xffffffffffffffff,
]);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SignatureError {
    #[error("Signature r component out of range")]
    InvalidR,
    #[error("Signature s component out of range")]
    InvalidS,
    #[error("Signature v component invalid: {0}")]
    InvalidV(u64),
    #[error("Signature component exceeds curve order")]
    SignatureTooLarge,
    #[error("Transaction chain id mismatch, expected chain id: {0}")]
    InvalidChainId(u64),
    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(#[from] EcdsaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    Legacy,
    Execute,
}

impl TxType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Legacy),
            EXECUTE_TX_TYPE => Some(Self::Execute),
            _ => None,
        }
    }
}

/// Destination of a transaction: a call to an existing account or the
/// creation of a new contract (encoded as the empty byte string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

impl RLPEncode for TxKind {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        match self {
            Self::Call(address) => address.encode(buf),
            Self::Create => [0u8; 0].encode(buf),
        }
    }
}

impl RLPDecode for TxKind {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = seqrex_rlp::decode::decode_bytes(rlp)?;
        match bytes.len() {
            0 => Ok((Self::Create, rest)),
            20 => Ok((Self::Call(Address::from_slice(bytes)), rest)),
            _ => Err(RLPDecodeError::invalid_length().with_context("TxKind")),
        }
    }
}

/// The `(r, s, v)` triple carried by every signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureComponents {
    pub r: U256,
    pub s: U256,
    pub v: u64,
}

impl SignatureComponents {
    /// Component validation: `0 < r < N`, `0 < s < N`,
    /// `v ∈ {27, 28} ∪ {x | x ≥ 35}`.
    ///
    /// Low-s canonical form is deliberately not enforced.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.r.is_zero() {
            return Err(SignatureError::InvalidR);
        }
        if self.s.is_zero() {
            return Err(SignatureError::InvalidS);
        }
        if self.r >= SECP256K1_ORDER || self.s >= SECP256K1_ORDER {
            return Err(SignatureError::SignatureTooLarge);
        }
        match self.v {
            27 | 28 => Ok(()),
            v if v >= 35 => Ok(()),
            v => Err(SignatureError::InvalidV(v)),
        }
    }

    /// EIP-155 chain id, when `v` carries one.
    pub fn chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    /// Recovery id in `{0, 1}` extracted from `v`.
    pub fn recovery_id(&self) -> u8 {
        if self.v >= 35 {
            ((self.v - 35) % 2) as u8
        } else {
            self.v.wrapping_sub(27) as u8
        }
    }

    fn to_compact(self) -> [u8; 64] {
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(&self.r.to_big_endian());
        sig[32..].copy_from_slice(&self.s.to_big_endian());
        sig
    }
}

/// Pre-EIP-2718 transaction, the only kind the sequencer executes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl RLPEncode for LegacyTransaction {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.v)
            .encode_field(&self.r)
            .encode_field(&self.s)
            .finish();
    }
}

impl RLPDecode for LegacyTransaction {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (gas_price, decoder) = decoder.decode_field("gas_price")?;
        let (gas_limit, decoder) = decoder.decode_field("gas_limit")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (v, decoder) = decoder.decode_field("v")?;
        let (r, decoder) = decoder.decode_field("r")?;
        let (s, decoder) = decoder.decode_field("s")?;
        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            v,
            r,
            s,
        };
        Ok((tx, decoder.finish()?))
    }
}

impl LegacyTransaction {
    pub fn signature(&self) -> SignatureComponents {
        SignatureComponents {
            r: self.r,
            s: self.s,
            v: self.v,
        }
    }

    /// Hash of the canonical encoding, used as the transaction id.
    pub fn compute_hash(&self) -> H256 {
        keccak_hash_h256(self.encode_to_vec())
    }

    /// The hash that was signed: the 6-field list pre-EIP-155, or the
    /// 9-field `[.., chain_id, 0, 0]` list when `v` carries a chain id.
    pub fn signing_hash(&self) -> H256 {
        let mut buf = Vec::new();
        let encoder = Encoder::new(&mut buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data);
        match self.signature().chain_id() {
            Some(chain_id) => encoder
                .encode_field(&chain_id)
                .encode_field(&0u8)
                .encode_field(&0u8)
                .finish(),
            None => encoder.finish(),
        }
        keccak_hash_h256(&buf)
    }

    /// Validates the signature components and recovers the sender address.
    pub fn recover_sender(&self) -> Result<Address, SignatureError> {
        let signature = self.signature();
        signature.validate()?;
        let hash = self.signing_hash();
        let public = recover_public(&signature.to_compact(), signature.recovery_id(), &hash.0)?;
        Ok(public_to_address(&public))
    }

    /// Round-trip self check: the signature recovers to some sender and that
    /// sender recovers again to the same address.
    pub fn verify(&self) -> bool {
        match (self.recover_sender(), self.recover_sender()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Enforces the EIP-155 form: rejects legacy `v ∈ {27, 28}` and chain id
    /// mismatches before recovering the sender.
    pub fn verify_with_chain_id(&self, expected_chain_id: u64) -> Result<Address, SignatureError> {
        let signature = self.signature();
        signature.validate()?;
        match signature.chain_id() {
            Some(chain_id) if chain_id == expected_chain_id => self.recover_sender(),
            _ => Err(SignatureError::InvalidChainId(expected_chain_id)),
        }
    }

    /// Signs the transaction in place with the given secret key,
    /// replay-protected for `chain_id` when one is provided.
    pub fn sign_inplace(
        &mut self,
        secret_key: &[u8; 32],
        chain_id: Option<u64>,
    ) -> Result<(), SignatureError> {
        self.v = match chain_id {
            Some(id) => id * 2 + 35,
            None => 27,
        };
        let hash = self.signing_hash();
        let (signature, v_legacy) =
            sign_hash(&hash.0, secret_key).map_err(SignatureError::RecoveryFailed)?;
        let recovery_bit = u64::from(v_legacy - 27);
        self.r = U256::from_big_endian(&signature[..32]);
        self.s = U256::from_big_endian(&signature[32..]);
        self.v = match chain_id {
            Some(id) => recovery_bit + id * 2 + 35,
            None => recovery_bit + 27,
        };
        Ok(())
    }
}

/// Type 0x7e envelope, forwarded opaquely to L1.
///
/// The body is kept as raw bytes; only the trailing `(v, r, s)` items of the
/// body list and the envelope hash are inspected locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteTransaction {
    pub payload: Bytes,
}

impl ExecuteTransaction {
    /// Hash of the full envelope, type byte included.
    pub fn compute_hash(&self) -> H256 {
        let mut buf = Vec::with_capacity(self.payload.len() + 1);
        buf.push(EXECUTE_TX_TYPE);
        buf.extend_from_slice(&self.payload);
        keccak_hash_h256(&buf)
    }

    /// Extracts the trailing `(v, r, s)` items of the body list.
    pub fn signature(&self) -> Result<SignatureComponents, RLPDecodeError> {
        let (is_list, mut payload, _) = decode_rlp_item(&self.payload)?;
        if !is_list {
            return Err(RLPDecodeError::unexpected_string().with_context("ExecuteTransaction"));
        }
        let mut items: Vec<&[u8]> = Vec::new();
        while !payload.is_empty() {
            let (item, rest) = seqrex_rlp::decode::get_item_with_prefix(payload)?;
            items.push(item);
            payload = rest;
        }
        let [.., v_item, r_item, s_item] = items.as_slice() else {
            return Err(RLPDecodeError::invalid_length().with_context("ExecuteTransaction"));
        };
        let v = u64::decode(v_item)?;
        let r = U256::decode(r_item)?;
        let s = U256::decode(s_item)?;
        Ok(SignatureComponents { r, s, v })
    }
}

/// Any transaction the sequencer accepts over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Legacy(LegacyTransaction),
    Execute(ExecuteTransaction),
}

impl Transaction {
    pub fn tx_type(&self) -> TxType {
        match self {
            Self::Legacy(_) => TxType::Legacy,
            Self::Execute(_) => TxType::Execute,
        }
    }

    pub fn compute_hash(&self) -> H256 {
        match self {
            Self::Legacy(tx) => tx.compute_hash(),
            Self::Execute(tx) => tx.compute_hash(),
        }
    }

    /// Mempool ordering key. Opaque envelopes never enter the priority pool,
    /// so they rank at zero.
    pub fn gas_price(&self) -> U256 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::Execute(_) => U256::zero(),
        }
    }

    pub fn gas_limit(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.gas_limit,
            Self::Execute(_) => 0,
        }
    }

    /// Canonical wire encoding: plain RLP for legacy transactions, an
    /// EIP-2718 `type || body` envelope otherwise.
    pub fn encode_canonical(&self, buf: &mut dyn bytes::BufMut) {
        match self {
            Self::Legacy(tx) => tx.encode(buf),
            Self::Execute(tx) => {
                buf.put_u8(EXECUTE_TX_TYPE);
                buf.put_slice(&tx.payload);
            }
        }
    }

    pub fn encode_canonical_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_canonical(&mut buf);
        buf
    }

    pub fn decode_canonical(bytes: &[u8]) -> Result<Self, RLPDecodeError> {
        let first = *bytes.first().ok_or(RLPDecodeError::invalid_length())?;
        if first >= 0xc0 {
            return Ok(Self::Legacy(LegacyTransaction::decode(bytes)?));
        }
        if first == EXECUTE_TX_TYPE {
            let body = &bytes[1..];
            // the body must be a well-formed, self-contained list
            let (is_list, _, rest) = decode_rlp_item(body)?;
            if !is_list || !rest.is_empty() {
                return Err(RLPDecodeError::malformed_data().with_context("ExecuteTransaction"));
            }
            return Ok(Self::Execute(ExecuteTransaction {
                payload: Bytes::copy_from_slice(body),
            }));
        }
        Err(RLPDecodeError::Custom(format!(
            "Unsupported transaction type: {first:#04x}"
        )))
    }
}

/// A transaction resident in the mempool, with the metadata the pool orders
/// and indexes by. The sender is recovered once at ingress and cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolTransaction {
    pub transaction: Transaction,
    pub hash: H256,
    pub sender: Address,
    pub priority: U256,
    pub received_at: u64,
}

impl MempoolTransaction {
    pub fn new(transaction: Transaction, sender: Address, received_at: u64) -> Self {
        let hash = transaction.compute_hash();
        let priority = transaction.gas_price();
        Self {
            transaction,
            hash,
            sender,
            priority,
            received_at,
        }
    }
}

// Ordering for the pool's max-heap: higher priority first, earlier receipt
// breaking ties. The hash keeps the order total.
impl Ord for MempoolTransaction {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.received_at.cmp(&self.received_at))
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

impl PartialOrd for MempoolTransaction {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
