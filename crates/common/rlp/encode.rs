use bytes::{BufMut, Bytes};
use ethereum_types::{Address, Bloom, H256, U256};

use super::constants::{RLP_EMPTY_LIST, RLP_NULL};

/// Encodes a value to a freshly allocated buffer.
/// For encoding into an existing buffer, use [`RLPEncode::encode`].
pub fn encode<T: RLPEncode>(value: T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.encode(&mut buf);
    buf
}

pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn length(&self) -> usize {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf.len()
    }

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

impl RLPEncode for bool {
    #[inline(always)]
    fn encode(&self, buf: &mut dyn BufMut) {
        if *self {
            buf.put_u8(0x01);
        } else {
            buf.put_u8(RLP_NULL);
        }
    }

    #[inline(always)]
    fn length(&self) -> usize {
        1
    }
}

// integer types: big-endian without leading zeros, zero encodes as 0x80

#[inline]
fn encode_integer_be<const N: usize>(value_be: [u8; N], buf: &mut dyn BufMut) {
    let mut i = 0;
    while i < N && value_be[i] == 0 {
        i += 1;
    }

    if i == N {
        buf.put_u8(RLP_NULL);
        return;
    }

    let first = value_be[i];

    // a single byte in [0x00, 0x7f] is its own encoding
    if i == N - 1 && first <= 0x7f {
        buf.put_u8(first);
        return;
    }

    let len = N - i;
    buf.put_u8(RLP_NULL + len as u8);
    buf.put_slice(&value_be[i..]);
}

impl RLPEncode for u8 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u16 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u32 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for usize {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_big_endian(), buf);
    }
}

impl RLPEncode for [u8] {
    #[inline(always)]
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.len() == 1 && self[0] < RLP_NULL {
            buf.put_u8(self[0]);
        } else {
            let len = self.len();
            if len < 56 {
                buf.put_u8(RLP_NULL + len as u8);
            } else {
                let be = len.to_be_bytes();
                let start = be.iter().position(|&x| x != 0).unwrap_or(be.len() - 1);
                buf.put_u8(0xb7 + (be.len() - start) as u8);
                buf.put_slice(&be[start..]);
            }
            buf.put_slice(self);
        }
    }
}

impl<const N: usize> RLPEncode for [u8; N] {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_ref().encode(buf)
    }
}

impl RLPEncode for Bytes {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_ref().encode(buf)
    }
}

impl RLPEncode for str {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for String {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for Address {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for H256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for Bloom {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl<T: RLPEncode> RLPEncode for Vec<T> {
    #[inline(always)]
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.is_empty() {
            buf.put_u8(RLP_EMPTY_LIST);
        } else {
            let payload_len: usize = self.iter().map(|item| item.length()).sum();
            encode_length(payload_len, buf);
            for item in self {
                item.encode(buf);
            }
        }
    }
}

impl<T: RLPEncode + ?Sized> RLPEncode for &T {
    fn encode(&self, buf: &mut dyn BufMut) {
        (*self).encode(buf)
    }
}

/// Writes the list prefix for a payload of the given length.
pub fn encode_length(total_len: usize, buf: &mut dyn BufMut) {
    if total_len < 56 {
        buf.put_u8(RLP_EMPTY_LIST + total_len as u8);
    } else {
        let be = total_len.to_be_bytes();
        let start = be.iter().position(|&x| x != 0).unwrap_or(be.len() - 1);
        buf.put_u8(0xf7 + (be.len() - start) as u8);
        buf.put_slice(&be[start..]);
    }
}

impl<S: RLPEncode, T: RLPEncode> RLPEncode for (S, T) {
    fn encode(&self, buf: &mut dyn BufMut) {
        super::structs::Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .finish();
    }
}

#[cfg(test)]
mod tests {
    use super::{RLPEncode, encode};
    use bytes::Bytes;
    use ethereum_types::{Address, U256};
    use hex_literal::hex;

    #[test]
    fn encode_integers() {
        assert_eq!(encode(0u64), vec![0x80]);
        assert_eq!(encode(1u64), vec![0x01]);
        assert_eq!(encode(0x7fu64), vec![0x7f]);
        assert_eq!(encode(0x80u64), vec![0x81, 0x80]);
        assert_eq!(encode(0x0400u64), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn encode_u256_matches_u64() {
        assert_eq!(encode(U256::zero()), encode(0u64));
        assert_eq!(encode(U256::from(1_000_000u64)), encode(1_000_000u64));
    }

    #[test]
    fn encode_bytes() {
        assert_eq!(encode([0x7fu8]), vec![0x7f]);
        assert_eq!(encode([0x80u8]), vec![0x81, 0x80]);
        assert_eq!(encode(Bytes::from_static(b"dog")), vec![0x83, b'd', b'o', b'g']);
        // 56-byte string takes the long form
        let long = vec![0xaau8; 56];
        let mut expected = vec![0xb8, 56];
        expected.extend_from_slice(&long);
        assert_eq!(encode(long.as_slice()), expected);
    }

    #[test]
    fn encode_empty_string_and_list() {
        assert_eq!(encode([0u8; 0]), vec![0x80]);
        assert_eq!(encode(Vec::<u64>::new()), vec![0xc0]);
    }

    #[test]
    fn encode_address() {
        let addr = Address::from_slice(&hex!("6177843db3138ae69679a54b95cf345ed759450d"));
        let mut expected = vec![0x94];
        expected.extend_from_slice(addr.as_bytes());
        assert_eq!(encode(addr), expected);
    }

    #[test]
    fn length_matches_encoded_len() {
        let value = (42u64, Bytes::from_static(b"hello"));
        assert_eq!(value.length(), value.encode_to_vec().len());
    }
}
