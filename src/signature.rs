use crate::PublicKey;
use ed25519_dalek::{Signature, VerifyingKey};
use std::convert::TryFrom;

/// Checks that `signature` was produced over `message` by the holder of `public_key`.
/// The ledger never signs anything itself, it only asks this capability.
pub trait SignatureVerifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&PublicKey, &[u8], &[u8]) -> bool,
{
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        self(public_key, message, signature)
    }
}

/// Verifies Ed25519 signatures.
/// Keys and signatures with a malformed encoding never verify.
#[derive(Debug, Default, Copy, Clone)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
        let key_bytes = match <[u8; 32]>::try_from(public_key.as_slice()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let verifying_key = match VerifyingKey::from_bytes(&key_bytes) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature = match Signature::from_slice(signature) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        verifying_key.verify_strict(message, &signature).is_ok()
    }
}
