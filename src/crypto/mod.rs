//! Cryptographic primitives for SharePass.
//!
//! - AES-256-GCM with an explicit IV (`encryption`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - The JSON sealed-blob format (`blob`)
//!
//! `derive_and_open` is the decryption engine the vault calls on every
//! unlock attempt; `seal` is its inverse, used by the `encrypt` helper.

pub mod blob;
pub mod encryption;
pub mod kdf;

use zeroize::Zeroizing;

pub use blob::SealedBlob;
pub use kdf::{derive_key, generate_salt, DEFAULT_ITERATIONS};

use crate::errors::Result;

/// Derive the key from `password` and `salt`, then authenticate and
/// decrypt `ciphertext` under `iv`.
///
/// Stateless: touches no storage.  Any failure is `DecryptionFailed`.
pub fn derive_and_open(
    salt: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    password: &[u8],
    iterations: u32,
) -> Result<Zeroizing<Vec<u8>>> {
    let key = derive_key(password, salt, iterations)?;
    let plaintext = encryption::decrypt(key.as_slice(), iv, ciphertext)?;
    Ok(Zeroizing::new(plaintext))
}

/// Open a parsed blob with `password`.
pub fn open_blob(blob: &SealedBlob, password: &[u8], iterations: u32) -> Result<Zeroizing<Vec<u8>>> {
    derive_and_open(&blob.salt, &blob.iv, &blob.ciphertext, password, iterations)
}

/// Seal `plaintext` under `password` with a fresh salt and IV.
pub fn seal(plaintext: &[u8], password: &[u8], iterations: u32) -> Result<SealedBlob> {
    let salt = generate_salt();
    let iv = encryption::generate_iv();
    let key = derive_key(password, &salt, iterations)?;
    let ciphertext = encryption::encrypt(key.as_slice(), &iv, plaintext)?;

    Ok(SealedBlob {
        salt: salt.to_vec(),
        iv: iv.to_vec(),
        ciphertext,
    })
}
