//! AES-256-GCM authenticated encryption with a caller-supplied IV.
//!
//! The sealed-blob format stores the IV separately from the ciphertext,
//! so unlike a nonce-prefixed layout both halves are passed explicitly.
//! The ciphertext always carries the 16-byte auth tag at its end and no
//! associated data is used.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{Result, SharePassError};

/// Size of the AES-256-GCM IV in bytes.
pub const IV_LEN: usize = 12;

/// Generate a random 12-byte IV.
pub fn generate_iv() -> [u8; IV_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&nonce);
    iv
}

/// Encrypt `plaintext` with a 32-byte `key` under `iv`.
///
/// Returns ciphertext || tag.
pub fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if iv.len() != IV_LEN {
        return Err(SharePassError::EncryptionFailed(format!(
            "IV must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SharePassError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|e| SharePassError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Decrypt ciphertext || tag produced under `key` and `iv`.
///
/// Every failure (bad IV length, bad key length, tag mismatch) is the
/// same `DecryptionFailed`; no partial plaintext is ever returned.
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    // Nonce::from_slice panics on the wrong length.
    if iv.len() != IV_LEN {
        return Err(SharePassError::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SharePassError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| SharePassError::DecryptionFailed)
}
