use chrono::Duration;
use thiserror::Error;

/// All errors that can occur in SharePass.
///
/// Per-request outcomes such as a wrong key or an expired secret are not
/// errors; they live in the outcome enums of `vault` and `quota`.
#[derive(Debug, Error)]
pub enum SharePassError {
    // --- Request rejections ---
    #[error("Secret not found or already unlocked")]
    NotFound,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Payload of {size} bytes exceeds the {max} byte limit")]
    SizeExceeded { size: usize, max: usize },

    #[error("Share quota exceeded, renews in {} minutes", .renewal_in.num_minutes())]
    QuotaExceeded { renewal_in: Duration },

    // --- Crypto errors ---
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid sealed blob: {0}")]
    InvalidBlob(String),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl From<rusqlite::Error> for SharePassError {
    fn from(e: rusqlite::Error) -> Self {
        SharePassError::Storage(e.to_string())
    }
}

/// Convenience type alias for SharePass results.
pub type Result<T> = std::result::Result<T, SharePassError>;
