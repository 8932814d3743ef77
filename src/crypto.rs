use ed25519_dalek::{PublicKey, Signature, Verifier};

use crate::errors::{ChainError, ChainResult};

/// Lowercase hex BLAKE3 digest of a UTF-8 string.
pub fn blake3_hex(data: &str) -> String {
    blake3::hash(data.as_bytes()).to_hex().to_string()
}

pub fn public_key_from_hex(data: &str) -> ChainResult<PublicKey> {
    let bytes = hex::decode(data)
        .map_err(|err| ChainError::Crypto(format!("invalid public key encoding: {err}")))?;
    PublicKey::from_bytes(&bytes)
        .map_err(|err| ChainError::Crypto(format!("invalid public key bytes: {err}")))
}

pub fn signature_from_hex(data: &str) -> ChainResult<Signature> {
    let bytes = hex::decode(data)
        .map_err(|err| ChainError::Crypto(format!("invalid signature encoding: {err}")))?;
    Signature::from_bytes(&bytes)
        .map_err(|err| ChainError::Crypto(format!("invalid signature bytes: {err}")))
}

/// Signature oracle over aggregated-proof messages. Total: malformed keys,
/// malformed signatures, and failed verification all report `false`.
pub fn verify_signature(message: &str, public_key: &str, signature: &str) -> bool {
    let Ok(public_key) = public_key_from_hex(public_key) else {
        return false;
    };
    let Ok(signature) = signature_from_hex(signature) else {
        return false;
    };
    public_key.verify(message.as_bytes(), &signature).is_ok()
}
