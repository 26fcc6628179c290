//! Runtime limits consumed by the vault, quota tracker and purger.

use chrono::Duration;

/// Every tunable the core components read.
///
/// Built from `Settings::limits()` in production; tests construct it
/// directly to shrink windows and KDF cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Creations allowed per identity within one window.
    pub max_uses: u32,
    /// Quota window; usage resets completely once it elapses.
    pub renewal_window: Duration,
    /// Lifetime of a stored secret.
    pub expiry: Duration,
    /// Delay between purge sweeps.
    pub purge_interval: std::time::Duration,
    /// Failed unlocks before the secret is destroyed.
    pub max_attempts: u32,
    /// Largest accepted sealed blob in bytes.
    pub max_payload_bytes: usize,
    /// PBKDF2 iteration count shared with the sealing side.
    pub kdf_iterations: u32,
}

impl Default for Limits {
    fn default() -> Self {
        super::Settings::default().limits()
    }
}
