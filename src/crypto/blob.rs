//! The sealed blob: what a client uploads and the vault stores verbatim.
//!
//! On the wire and in the database it is a JSON object with three
//! standard-base64 fields:
//!
//! ```text
//! {"salt": "<16 bytes>", "iv": "<12 bytes>", "ciphertext": "<ct || 16-byte tag>"}
//! ```
//!
//! The vault only parses it when an unlock is attempted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SharePassError};

/// Parsed form of a sealed secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBlob {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub iv: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Parse the stored JSON text.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| SharePassError::InvalidBlob(e.to_string()))
    }

    /// Serialize back to the stored JSON text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SharePassError::SerializationError(e.to_string()))
    }
}

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
