use base64::Engine;
use serde::{Deserialize, Serialize};

/// Output encoding applied to a raw signature digest.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureEncoding {
    /// Lowercase hex characters.
    Hex,
    /// Standard base64 alphabet with padding.
    Base64,
}

impl Default for SignatureEncoding {
    fn default() -> Self {
        Self::Hex
    }
}

impl SignatureEncoding {
    /// Encode the digest bytes into the configured `String` format.
    pub fn encode<Bytes>(&self, data: Bytes) -> String
    where
        Bytes: AsRef<[u8]>,
    {
        match self {
            SignatureEncoding::Hex => hex::encode(data),
            SignatureEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(data),
        }
    }
}
