//! Integration tests for the SharePass crypto layer.

use sharepass::crypto::{self, SealedBlob, DEFAULT_ITERATIONS};
use sharepass::errors::SharePassError;

const ITERATIONS: u32 = 1_000;

// ---------------------------------------------------------------------------
// Seal / open
// ---------------------------------------------------------------------------

#[test]
fn seal_then_open_returns_plaintext() {
    let blob = crypto::seal(b"database password", b"correct horse", ITERATIONS).unwrap();
    let plaintext = crypto::open_blob(&blob, b"correct horse", ITERATIONS).unwrap();
    assert_eq!(plaintext.as_slice(), b"database password");
}

#[test]
fn wrong_password_fails() {
    let blob = crypto::seal(b"secret", b"right", ITERATIONS).unwrap();
    let result = crypto::open_blob(&blob, b"wrong", ITERATIONS);
    assert!(matches!(result, Err(SharePassError::DecryptionFailed)));
}

#[test]
fn iteration_count_must_match() {
    let blob = crypto::seal(b"secret", b"pw", ITERATIONS).unwrap();
    assert!(crypto::open_blob(&blob, b"pw", ITERATIONS + 1).is_err());
}

#[test]
fn every_seal_uses_fresh_salt_and_iv() {
    let a = crypto::seal(b"same", b"same", ITERATIONS).unwrap();
    let b = crypto::seal(b"same", b"same", ITERATIONS).unwrap();
    assert_ne!(a.salt, b.salt);
    assert_ne!(a.iv, b.iv);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn ciphertext_carries_the_auth_tag() {
    let blob = crypto::seal(b"12345", b"pw", ITERATIONS).unwrap();
    assert_eq!(blob.salt.len(), 16);
    assert_eq!(blob.iv.len(), 12);
    assert_eq!(blob.ciphertext.len(), 5 + 16);
}

#[test]
fn empty_plaintext_round_trips() {
    let blob = crypto::seal(b"", b"pw", ITERATIONS).unwrap();
    assert!(crypto::open_blob(&blob, b"pw", ITERATIONS).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Tampering
// ---------------------------------------------------------------------------

#[test]
fn any_flipped_byte_is_detected() {
    let blob = crypto::seal(b"integrity", b"pw", ITERATIONS).unwrap();

    for i in 0..blob.ciphertext.len() {
        let mut tampered = blob.clone();
        tampered.ciphertext[i] ^= 0x80;
        assert!(
            crypto::open_blob(&tampered, b"pw", ITERATIONS).is_err(),
            "flip at ciphertext[{i}] went unnoticed"
        );
    }

    let mut tampered = blob.clone();
    tampered.iv[11] ^= 0x01;
    assert!(crypto::open_blob(&tampered, b"pw", ITERATIONS).is_err());

    let mut tampered = blob;
    tampered.salt[0] ^= 0x01;
    assert!(crypto::open_blob(&tampered, b"pw", ITERATIONS).is_err());
}

#[test]
fn short_iv_is_rejected_not_panicking() {
    let mut blob = crypto::seal(b"x", b"pw", ITERATIONS).unwrap();
    blob.iv.truncate(8);
    assert!(matches!(
        crypto::open_blob(&blob, b"pw", ITERATIONS),
        Err(SharePassError::DecryptionFailed)
    ));
}

#[test]
fn truncated_ciphertext_fails() {
    let mut blob = crypto::seal(b"hello", b"pw", ITERATIONS).unwrap();
    blob.ciphertext.truncate(4);
    assert!(crypto::open_blob(&blob, b"pw", ITERATIONS).is_err());
}

// ---------------------------------------------------------------------------
// Blob format
// ---------------------------------------------------------------------------

#[test]
fn blob_json_has_three_base64_fields() {
    let blob = crypto::seal(b"x", b"pw", ITERATIONS).unwrap();
    let json: serde_json::Value = serde_json::from_str(&blob.to_json().unwrap()).unwrap();

    for field in ["salt", "iv", "ciphertext"] {
        assert!(json[field].is_string(), "missing {field}");
    }
    assert_eq!(SealedBlob::parse(&blob.to_json().unwrap()).unwrap(), blob);
}

#[test]
fn malformed_blobs_are_rejected() {
    for raw in [
        "",
        "not json",
        "{}",
        r#"{"salt":"AAAA","iv":"AAAA"}"#,
        r#"{"salt":"@@@","iv":"AAAA","ciphertext":"AAAA"}"#,
    ] {
        assert!(
            matches!(SealedBlob::parse(raw), Err(SharePassError::InvalidBlob(_))),
            "accepted {raw:?}"
        );
    }
}

#[test]
fn default_iteration_count_is_one_hundred_thousand() {
    assert_eq!(DEFAULT_ITERATIONS, 100_000);
    assert_eq!(
        sharepass::config::Settings::default().kdf_iterations,
        DEFAULT_ITERATIONS
    );
}
