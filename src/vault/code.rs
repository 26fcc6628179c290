//! Download codes: the public, single-use handle to a stored secret.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Length of every download code.
pub const CODE_LEN: usize = 12;

/// Generate a fresh 12-character alphanumeric code.
///
/// Drawn from the thread-local CSPRNG (62^12 possible codes).
pub fn generate_download_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LEN)
        .map(char::from)
        .collect()
}

/// Check the code shape without touching storage.
pub fn is_valid_download_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Short, log-safe prefix of a validated code.
pub(crate) fn redact(code: &str) -> &str {
    code.get(..4).unwrap_or("????")
}
