//! Caller identity for quota accounting.
//!
//! The raw network address is never stored; only its SHA-256 hex digest.

use std::fmt;

use sha2::{Digest, Sha256};

/// Opaque, non-reversible caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a network address into an identity token.
pub fn hash_identity(addr: &str) -> IdentityToken {
    let digest = Sha256::digest(addr.as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    IdentityToken(hex)
}

/// Pick the caller's address and hash it.
///
/// The first entry of an `X-Forwarded-For` list wins when present and
/// non-empty; otherwise the socket's remote address is used.
pub fn client_identity(forwarded_for: Option<&str>, remote: &str) -> IdentityToken {
    let forwarded = forwarded_for
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    hash_identity(forwarded.unwrap_or(remote))
}
