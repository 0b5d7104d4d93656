use bytes::Bytes;
use ethereum_types::{Address, Bloom, H160, H256, U256};

use super::{
    constants::{RLP_EMPTY_LIST, RLP_NULL},
    error::RLPDecodeError,
};

/// Max payload size accepted when decoding.
/// Any size is spec-compliant, but no well-formed message in this node gets
/// anywhere near this, so larger payloads are either bugs or malicious.
const MAX_RLP_BYTES: usize = 1024 * 1024 * 1024;

/// Trait for decoding RLP encoded slices of data.
/// Implementors provide [`decode_unfinished`](RLPDecode::decode_unfinished),
/// which returns the decoded value together with the remaining bytes;
/// consumers normally call [`decode`](RLPDecode::decode).
pub trait RLPDecode: Sized {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError>;

    fn decode(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let (decoded, remaining) = Self::decode_unfinished(rlp)?;
        if !remaining.is_empty() {
            return Err(RLPDecodeError::invalid_length());
        }
        Ok(decoded)
    }
}

impl RLPDecode for bool {
    #[inline(always)]
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let first = buf.first().ok_or(RLPDecodeError::invalid_length())?;
        let value = match first {
            &RLP_NULL => false,
            0x01 => true,
            b => return Err(RLPDecodeError::malformed_boolean(*b)),
        };
        Ok((value, &buf[1..]))
    }
}

impl RLPDecode for u8 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let padded: [u8; 1] = static_left_pad(bytes)?;
        Ok((padded[0], rest))
    }
}

impl RLPDecode for u16 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((u16::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for u32 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((u32::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for u64 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((u64::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for usize {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((usize::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for U256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let padded: [u8; 32] = static_left_pad(bytes)?;
        Ok((U256::from_big_endian(&padded), rest))
    }
}

impl<const N: usize> RLPDecode for [u8; N] {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let value = bytes
            .try_into()
            .map_err(|_| RLPDecodeError::invalid_length())?;
        Ok((value, rest))
    }
}

impl RLPDecode for Bytes {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((Bytes::copy_from_slice(bytes), rest))
    }
}

impl RLPDecode for String {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let value =
            String::from_utf8(bytes.to_vec()).map_err(|_| RLPDecodeError::malformed_data())?;
        Ok((value, rest))
    }
}

impl RLPDecode for Address {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = RLPDecode::decode_unfinished(rlp)?;
        Ok((H160(value), rest))
    }
}

impl RLPDecode for H256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = RLPDecode::decode_unfinished(rlp)?;
        Ok((H256(value), rest))
    }
}

impl RLPDecode for Bloom {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = RLPDecode::decode_unfinished(rlp)?;
        Ok((Bloom(value), rest))
    }
}

impl<T: RLPDecode> RLPDecode for Vec<T> {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, mut payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::unexpected_string());
        }
        let mut items = Vec::new();
        while !payload.is_empty() {
            let (item, remaining) = T::decode_unfinished(payload)?;
            items.push(item);
            payload = remaining;
        }
        Ok((items, rest))
    }
}

impl<S: RLPDecode, T: RLPDecode> RLPDecode for (S, T) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = super::structs::Decoder::new(rlp)?;
        let (first, decoder) = decoder.decode_field("0")?;
        let (second, decoder) = decoder.decode_field("1")?;
        Ok(((first, second), decoder.finish()?))
    }
}

/// Splits the first RLP item off the given slice.
/// Returns `(is_list, payload, remaining)`.
pub fn decode_rlp_item(data: &[u8]) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let first_byte = *data.first().ok_or(RLPDecodeError::invalid_length())?;

    match first_byte {
        0..=0x7f => Ok((false, &data[..1], &data[1..])),
        0x80..=0xb7 => {
            let length = (first_byte - RLP_NULL) as usize;
            if data.len() < length + 1 {
                return Err(RLPDecodeError::invalid_length());
            }
            Ok((false, &data[1..length + 1], &data[length + 1..]))
        }
        0xb8..=0xbf => {
            let length_of_length = (first_byte - 0xb7) as usize;
            if data.len() < length_of_length + 1 {
                return Err(RLPDecodeError::invalid_length());
            }
            let length = usize::from_be_bytes(static_left_pad(&data[1..length_of_length + 1])?);
            if length > MAX_RLP_BYTES || data.len() < length_of_length + length + 1 {
                return Err(RLPDecodeError::invalid_length());
            }
            Ok((
                false,
                &data[length_of_length + 1..length_of_length + length + 1],
                &data[length_of_length + length + 1..],
            ))
        }
        RLP_EMPTY_LIST..=0xf7 => {
            let length = (first_byte - RLP_EMPTY_LIST) as usize;
            if data.len() < length + 1 {
                return Err(RLPDecodeError::invalid_length());
            }
            Ok((true, &data[1..length + 1], &data[length + 1..]))
        }
        0xf8..=0xff => {
            let length_of_length = (first_byte - 0xf7) as usize;
            if data.len() < length_of_length + 1 {
                return Err(RLPDecodeError::invalid_length());
            }
            let length = usize::from_be_bytes(static_left_pad(&data[1..length_of_length + 1])?);
            if length > MAX_RLP_BYTES || data.len() < length_of_length + length + 1 {
                return Err(RLPDecodeError::invalid_length());
            }
            Ok((
                true,
                &data[length_of_length + 1..length_of_length + length + 1],
                &data[length_of_length + length + 1..],
            ))
        }
    }
}

/// Splits the first RLP item off the given slice, keeping its prefix.
/// Returns `(item_with_prefix, remaining)`.
pub fn get_item_with_prefix(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (_, payload, rest) = decode_rlp_item(data)?;
    let consumed = data.len() - rest.len();
    debug_assert!(payload.len() <= consumed);
    Ok((&data[..consumed], rest))
}

/// Decodes the payload of an RLP string item.
/// Returns the payload and the remaining bytes after the item.
pub fn decode_bytes(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (is_list, payload, rest) = decode_rlp_item(data)?;
    if is_list {
        return Err(RLPDecodeError::unexpected_list());
    }
    Ok((payload, rest))
}

/// Left-pads a big-endian byte slice to a fixed-size array.
/// Leading zero bytes in the input are malformed (non-canonical integers).
#[inline]
pub fn static_left_pad<const N: usize>(data: &[u8]) -> Result<[u8; N], RLPDecodeError> {
    let mut result = [0; N];

    if data.is_empty() {
        return Ok(result);
    }
    if data[0] == 0 {
        return Err(RLPDecodeError::malformed_data());
    }
    if data.len() > N {
        return Err(RLPDecodeError::invalid_length());
    }
    result[N - data.len()..].copy_from_slice(data);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::RLPEncode;
    use hex_literal::hex;

    #[test]
    fn decode_integers_round_trip() {
        for value in [0u64, 1, 0x7f, 0x80, 0xffff, u64::MAX] {
            let encoded = value.encode_to_vec();
            assert_eq!(u64::decode(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn decode_rejects_leading_zero_integers() {
        // 0x8200 0x01 would decode to 1 but is non-canonical
        assert!(u64::decode(&[0x82, 0x00, 0x01]).is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        assert!(u64::decode(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn decode_vec_of_hashes() {
        let hashes = vec![H256::repeat_byte(1), H256::repeat_byte(2)];
        let encoded = hashes.encode_to_vec();
        assert_eq!(Vec::<H256>::decode(&encoded).unwrap(), hashes);
    }

    #[test]
    fn decode_address() {
        let encoded = hex!("946177843db3138ae69679a54b95cf345ed759450d");
        let decoded = Address::decode(&encoded).unwrap();
        assert_eq!(
            decoded,
            Address::from_slice(&hex!("6177843db3138ae69679a54b95cf345ed759450d"))
        );
    }

    #[test]
    fn decode_truncated_input_fails() {
        // long-string prefix claiming 200 bytes with nothing behind it
        assert!(decode_rlp_item(&[0xb8, 0xc8]).is_err());
        // short list missing part of its payload
        assert!(decode_rlp_item(&[0xc3, 0x01]).is_err());
    }

    #[test]
    fn get_item_keeps_prefix() {
        let mut buf = Vec::new();
        "dog".encode(&mut buf);
        1u8.encode(&mut buf);
        let (item, rest) = get_item_with_prefix(&buf).unwrap();
        assert_eq!(item, &[0x83, b'd', b'o', b'g']);
        assert_eq!(rest, &[0x01]);
    }
}
