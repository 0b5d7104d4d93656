use ethereum_types::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 of the given data.
///
/// This is the original Keccak submission (padding byte 0x01), not FIPS
/// SHA3-256. Signature hashing and address derivation depend on it.
pub fn keccak_hash(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

/// Keccak-256 returning an `H256`.
pub fn keccak_hash_h256(data: impl AsRef<[u8]>) -> H256 {
    H256(keccak_hash(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn keccak_of_empty_input() {
        // Known vector distinguishing Keccak-256 from SHA3-256
        assert_eq!(
            keccak_hash([]),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn keccak_of_ascii() {
        assert_eq!(
            keccak_hash(b"hello"),
            hex!("1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8")
        );
    }
}
