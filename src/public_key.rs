use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The owner of a transaction output.
/// The bytes are opaque to the ledger, they are only interpreted by the signature verifier.
#[derive(Debug, Clone, Hash, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn new(public_key: Vec<u8>) -> Self {
        Self(public_key)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}
