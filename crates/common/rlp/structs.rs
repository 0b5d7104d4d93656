use bytes::BufMut;

use super::{
    decode::{RLPDecode, decode_rlp_item, get_item_with_prefix},
    encode::{RLPEncode, encode_length},
    error::RLPDecodeError,
};

/// # Struct decoding helper
///
/// Decodes a struct from RLP format. The struct is expected as a list, with
/// its values being the fields in the order they are passed to
/// [`Decoder::decode_field`].
#[derive(Debug)]
#[must_use = "`Decoder` must be consumed with `finish` to perform decoding checks"]
pub struct Decoder<'a> {
    payload: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, RLPDecodeError> {
        match decode_rlp_item(buf)? {
            (true, payload, remaining) => Ok(Self { payload, remaining }),
            (false, _, _) => Err(RLPDecodeError::unexpected_string()),
        }
    }

    pub fn decode_field<T: RLPDecode>(self, name: &str) -> Result<(T, Self), RLPDecodeError> {
        let (field, rest) = <T as RLPDecode>::decode_unfinished(self.payload)
            .map_err(|err| field_decode_error::<T>(name, err))?;
        let updated_self = Self {
            payload: rest,
            ..self
        };
        Ok((field, updated_self))
    }

    /// Returns the next field without decoding it, i.e. the payload bytes
    /// including its RLP prefix.
    pub fn get_encoded_item(self) -> Result<(Vec<u8>, Self), RLPDecodeError> {
        let (field, rest) = get_item_with_prefix(self.payload)?;
        let updated_self = Self {
            payload: rest,
            ..self
        };
        Ok((field.to_vec(), updated_self))
    }

    /// Returns `Some(field)` if there is a field left to decode, else `None`.
    pub fn decode_optional_field<T: RLPDecode>(self) -> (Option<T>, Self) {
        match <T as RLPDecode>::decode_unfinished(self.payload) {
            Ok((field, rest)) => {
                let updated_self = Self {
                    payload: rest,
                    ..self
                };
                (Some(field), updated_self)
            }
            Err(_) => (None, self),
        }
    }

    /// Finishes decoding the struct and returns the bytes after the item.
    /// Fails if the list payload was not fully consumed.
    pub const fn finish(self) -> Result<&'a [u8], RLPDecodeError> {
        if self.payload.is_empty() {
            Ok(self.remaining)
        } else {
            Err(RLPDecodeError::MalformedData(None))
        }
    }

    /// Returns true if the list payload has been fully consumed.
    pub const fn is_done(&self) -> bool {
        self.payload.is_empty()
    }
}

fn field_decode_error<T>(field_name: &str, err: RLPDecodeError) -> RLPDecodeError {
    let typ = std::any::type_name::<T>();
    RLPDecodeError::Custom(format!(
        "Error decoding field '{field_name}' of type {typ}: {err}"
    ))
}

/// # Struct encoding helper
///
/// Encodes a struct into RLP format as a list, with its values being the
/// fields in the order they are passed to [`Encoder::encode_field`].
#[must_use = "`Encoder` must be consumed with `finish` to perform the encoding"]
pub struct Encoder<'a> {
    buf: &'a mut dyn BufMut,
    temp_buf: Vec<u8>,
}

impl core::fmt::Debug for Encoder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Encoder")
            .field("buf", &"...")
            .field("temp_buf", &self.temp_buf)
            .finish()
    }
}

impl<'a> Encoder<'a> {
    /// Creates a new encoder that writes to the given buffer.
    pub fn new(buf: &'a mut dyn BufMut) -> Self {
        Self {
            buf,
            temp_buf: Default::default(),
        }
    }

    /// Stores a field to be encoded.
    pub fn encode_field<T: RLPEncode>(mut self, value: &T) -> Self {
        <T as RLPEncode>::encode(value, &mut self.temp_buf);
        self
    }

    /// If `Some`, stores a field to be encoded, else does nothing.
    pub fn encode_optional_field<T: RLPEncode>(mut self, opt_value: &Option<T>) -> Self {
        if let Some(value) = opt_value {
            <T as RLPEncode>::encode(value, &mut self.temp_buf);
        }
        self
    }

    /// Stores a field to be encoded as bytes.
    /// Bypasses the conflicting implementations between `Vec<T>` and `Vec<u8>`.
    pub fn encode_bytes(mut self, value: &[u8]) -> Self {
        <[u8] as RLPEncode>::encode(value, &mut self.temp_buf);
        self
    }

    /// Adds an already-encoded item to the list without re-encoding it.
    pub fn encode_raw(mut self, value: &[u8]) -> Self {
        self.temp_buf.put_slice(value);
        self
    }

    /// Finishes encoding the struct and writes the result to the buffer.
    pub fn finish(self) {
        encode_length(self.temp_buf.len(), self.buf);
        self.buf.put_slice(&self.temp_buf);
    }
}

#[cfg(test)]
mod tests {
    use super::{Decoder, Encoder};
    use crate::encode::RLPEncode;

    #[derive(Debug, PartialEq, Eq)]
    struct Simple {
        pub a: u8,
        pub b: u16,
    }

    #[test]
    fn encoder_simple_struct() {
        let expected = Simple { a: 61, b: 75 };
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&expected.a)
            .encode_field(&expected.b)
            .finish();
        assert_eq!(buf, vec![0xc2, 61, 75]);

        let decoder = Decoder::new(&buf).unwrap();
        let (a, decoder) = decoder.decode_field::<u8>("a").unwrap();
        let (b, decoder) = decoder.decode_field::<u16>("b").unwrap();
        assert!(decoder.finish().unwrap().is_empty());
        assert_eq!(Simple { a, b }, expected);
    }

    #[test]
    fn decoder_rejects_leftover_fields() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&1u8)
            .encode_field(&2u8)
            .finish();
        let decoder = Decoder::new(&buf).unwrap();
        let (_, decoder) = decoder.decode_field::<u8>("a").unwrap();
        assert!(decoder.finish().is_err());
    }

    #[test]
    fn optional_field_absent() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).encode_field(&1u8).finish();
        let decoder = Decoder::new(&buf).unwrap();
        let (_, decoder) = decoder.decode_field::<u8>("a").unwrap();
        let (opt, decoder) = decoder.decode_optional_field::<u8>();
        assert!(opt.is_none());
        assert!(decoder.finish().unwrap().is_empty());
    }

    #[test]
    fn encode_raw_passthrough() {
        let mut inner = Vec::new();
        "dog".encode(&mut inner);
        let mut buf = Vec::new();
        Encoder::new(&mut buf).encode_raw(&inner).finish();
        assert_eq!(buf, vec![0xc4, 0x83, b'd', b'o', b'g']);
    }
}
