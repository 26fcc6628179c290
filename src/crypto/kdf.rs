//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is a contract with whatever sealed the blob (the
//! browser client and `sharepass encrypt` both use 100 000).  A mismatch
//! does not error; it simply derives a different key and every unlock
//! fails authentication.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::errors::{Result, SharePassError};

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the salt generated when sealing.
pub const SALT_LEN: usize = 16;

/// Iteration count shared with the sealing side.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Derive a 32-byte key from `password` and `salt`.
///
/// The key is wrapped in `Zeroizing` so it is wiped when dropped.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if iterations == 0 {
        return Err(SharePassError::KeyDerivationFailed(
            "PBKDF2 iterations must be at least 1".into(),
        ));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut *key);
    Ok(key)
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    use aes_gcm::aead::rand_core::RngCore;
    use aes_gcm::aead::OsRng;

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_rfc7914_test_vector() {
        // PBKDF2-HMAC-SHA256("passwd", "salt", c = 1), first 32 bytes.
        let key = derive_key(b"passwd", b"salt", 1).unwrap();
        let expected: [u8; 32] = [
            0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f, 0xec, 0x16, 0x91, 0xc2, 0x25, 0x44,
            0xb6, 0x05, 0xf9, 0x41, 0x85, 0x21, 0x6d, 0xde, 0x04, 0x65, 0xe6, 0x8b, 0x9d, 0x57,
            0xc2, 0x0d, 0xac, 0xbc,
        ];
        assert_eq!(*key, expected);
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(derive_key(b"pw", b"salt", 0).is_err());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
