//! Ed25519 key material for node identities.
//!
//! Keys are stored and published as standard (padded) base64. Public keys are
//! the raw 32-byte point; private keys are the 64-byte `seed || public` form,
//! so a stored private key also pins the public half it must match.

use crate::IdentityError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{SigningKey, VerifyingKey, KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;

/// Generates a fresh Ed25519 keypair from the operating system entropy source.
///
/// # Errors
///
/// Returns [`IdentityError::Entropy`] if the entropy source fails. Callers
/// should treat this as fatal; retrying will not help.
pub fn generate_keypair() -> Result<(VerifyingKey, SigningKey), IdentityError> {
    let mut seed = [0u8; SECRET_KEY_LENGTH];
    OsRng
        .try_fill_bytes(&mut seed)
        .map_err(|e| IdentityError::Entropy(e.to_string()))?;

    let signing_key = SigningKey::from_bytes(&seed);
    Ok((signing_key.verifying_key(), signing_key))
}

pub fn encode_public_key(key: &VerifyingKey) -> String {
    STANDARD.encode(key.as_bytes())
}

pub fn encode_private_key(key: &SigningKey) -> String {
    STANDARD.encode(key.to_keypair_bytes())
}

/// Decodes a base64 public key.
///
/// # Errors
///
/// Returns [`IdentityError::MalformedKey`] on invalid base64, a decoded length
/// other than 32 bytes, or bytes that are not a valid curve point.
pub fn decode_public_key(encoded: &str) -> Result<VerifyingKey, IdentityError> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] = decode_fixed(encoded)?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| IdentityError::MalformedKey(e.to_string()))
}

/// Decodes a base64 private key in `seed || public` form.
///
/// # Errors
///
/// Returns [`IdentityError::MalformedKey`] on invalid base64, a decoded length
/// other than 64 bytes, or a public half that does not belong to the seed.
pub fn decode_private_key(encoded: &str) -> Result<SigningKey, IdentityError> {
    let bytes: [u8; KEYPAIR_LENGTH] = decode_fixed(encoded)?;
    SigningKey::from_keypair_bytes(&bytes).map_err(|e| IdentityError::MalformedKey(e.to_string()))
}

fn decode_fixed<const N: usize>(encoded: &str) -> Result<[u8; N], IdentityError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| IdentityError::MalformedKey(format!("invalid base64: {e}")))?;

    let found = bytes.len();
    bytes.try_into().map_err(|_| {
        IdentityError::MalformedKey(format!("expected {N} bytes, found {found}"))
    })
}
