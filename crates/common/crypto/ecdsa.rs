use ethereum_types::Address;
use thiserror::Error;

use crate::keccak::keccak_hash;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EcdsaError {
    #[error("Invalid signature r or s component")]
    InvalidSignature,
    #[error("Invalid recovery id")]
    InvalidRecoveryId,
    #[error("Invalid secret key")]
    InvalidSecretKey,
    #[error("Signature recovery failed")]
    RecoveryFailed,
}

/// Signs a 32-byte message hash, returning `(signature_64, v)` where the
/// 64 bytes are `r || s` and `v = recovery_id + 27` (legacy convention).
///
/// Signing is deterministic per RFC 6979.
pub fn sign_hash(msg: &[u8; 32], secret_key: &[u8; 32]) -> Result<([u8; 64], u8), EcdsaError> {
    let secret =
        secp256k1::SecretKey::from_slice(secret_key).map_err(|_| EcdsaError::InvalidSecretKey)?;
    let message = secp256k1::Message::from_digest(*msg);
    let (recovery_id, signature) = secp256k1::SECP256K1
        .sign_ecdsa_recoverable(&message, &secret)
        .serialize_compact();
    let recid = recovery_id.to_i32() as u8;
    Ok((signature, recid.wrapping_add(27)))
}

/// Recovers the uncompressed 64-byte public key (x || y, no 0x04 prefix)
/// from a signature over the given message hash.
///
/// `recovery_id` must be in `{0..3}`. Fails on malformed `r`/`s`, an
/// out-of-range recovery id, or when no point can be recovered.
pub fn recover_public(
    sig: &[u8; 64],
    recovery_id: u8,
    msg: &[u8; 32],
) -> Result<[u8; 64], EcdsaError> {
    let recovery_id = secp256k1::ecdsa::RecoveryId::from_i32(recovery_id as i32)
        .map_err(|_| EcdsaError::InvalidRecoveryId)?;

    let recoverable_sig = secp256k1::ecdsa::RecoverableSignature::from_compact(sig, recovery_id)
        .map_err(|_| EcdsaError::InvalidSignature)?;

    let message = secp256k1::Message::from_digest(*msg);

    let public_key = secp256k1::SECP256K1
        .recover_ecdsa(&message, &recoverable_sig)
        .map_err(|_| EcdsaError::RecoveryFailed)?;

    let mut out = [0u8; 64];
    out.copy_from_slice(&public_key.serialize_uncompressed()[1..]);
    Ok(out)
}

/// Derives the Ethereum address from an uncompressed 64-byte public key:
/// the last 20 bytes of `keccak256(pub_x || pub_y)`.
pub fn public_to_address(public: &[u8; 64]) -> Address {
    let hash = keccak_hash(public);
    Address::from_slice(&hash[12..])
}
