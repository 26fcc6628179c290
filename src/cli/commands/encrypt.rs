//! `sharepass encrypt`: seal a secret the way the browser client does.

use serde_json::json;

use crate::cli::{load_settings, output, read_input, Cli};
use crate::crypto;
use crate::errors::{Result, SharePassError};

/// Execute the `encrypt` command.
pub fn execute(cli: &Cli, secret: Option<&str>, key: &str, format: &str, url: &str) -> Result<()> {
    if format != "json" && format != "curl" {
        return Err(SharePassError::InvalidFormat(format!(
            "unknown output format '{format}' (expected json or curl)"
        )));
    }

    let secret = zeroize::Zeroizing::new(read_input(secret, false)?);
    if secret.is_empty() {
        return Err(SharePassError::InvalidFormat("secret cannot be empty".into()));
    }
    if key.is_empty() {
        return Err(SharePassError::InvalidFormat("key cannot be empty".into()));
    }

    let settings = load_settings(cli)?;
    let blob = crypto::seal(secret.as_bytes(), key.as_bytes(), settings.kdf_iterations)?
        .to_json()?;

    if format == "json" {
        println!("{blob}");
        return Ok(());
    }

    let payload = json!({ "encrypted_secret": blob }).to_string();
    let escaped = payload.replace('\'', "'\\''");
    let base = url.trim_end_matches('/');

    println!("# Encrypt and create secret:");
    println!("curl -X POST {base}/api/lock \\");
    println!("  -H 'Content-Type: application/json' \\");
    println!("  -d '{escaped}'");
    println!();
    println!("# To retrieve the secret:");
    println!("# curl -X POST {base}/api/unlock \\");
    println!("#   -H 'Content-Type: application/json' \\");
    println!("#   -d '{{\"download_code\": \"<CODE>\", \"key\": \"<KEY>\"}}'");

    output::tip("Keep the key separate from the link you share.");
    Ok(())
}
