//! Vault module: one-time secret storage.
//!
//! This module provides:
//! - Download code generation and validation (`code`)
//! - `SecretRecord` and the outcome enums (`record`)
//! - `VaultStore`, the SQLite-backed record lifecycle (`store`)

pub mod code;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use code::{generate_download_code, is_valid_download_code, CODE_LEN};
pub use record::{SecretRecord, TimeRemaining, UnlockOutcome};
pub use store::VaultStore;
