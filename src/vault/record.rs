//! Stored secret records and the outcomes vault operations report.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// One row of the `secrets` table.
#[derive(Debug, Clone)]
pub struct SecretRecord {
    /// Internal identifier, never reused.
    pub id: String,
    /// Sealed blob exactly as uploaded (JSON text).
    pub ciphertext_blob: String,
    /// Failed unlock attempts so far.
    pub attempts: u32,
    /// Public retrieval code.
    pub download_code: String,
    pub upload_time: DateTime<Utc>,
}

/// Result of an unlock attempt.
///
/// A malformed stored blob is reported as `WrongKey` (or `Exhausted`),
/// never as a distinct outcome.
#[derive(Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Decryption succeeded; the record is gone.
    Unlocked { plaintext: Zeroizing<String> },
    /// Decryption failed; the secret survives for now.
    WrongKey { attempts_remaining: u32 },
    /// That was the last allowed attempt; the record is gone.
    Exhausted,
    /// Unknown, malformed, or already consumed code.
    NotFound,
}

impl fmt::Debug for UnlockOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocked { .. } => f.write_str("Unlocked { plaintext: <redacted> }"),
            Self::WrongKey { attempts_remaining } => f
                .debug_struct("WrongKey")
                .field("attempts_remaining", attempts_remaining)
                .finish(),
            Self::Exhausted => f.write_str("Exhausted"),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

/// How long a secret has left before expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Available { hours: i64, minutes: i64 },
    /// Past its expiry but not yet swept.
    Expired,
    NotFound,
}
