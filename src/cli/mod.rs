//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, SharePassError};
use crate::identity::{client_identity, IdentityToken};
use crate::service::SharePass;

/// SharePass CLI: one-time encrypted secret sharing.
#[derive(Parser)]
#[command(
    name = "sharepass",
    about = "One-time encrypted secret sharing",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding sharepass.toml (default: current directory)
    #[arg(long, default_value = ".", env = "SHAREPASS_CONFIG_DIR", global = true)]
    pub config_dir: String,

    /// Database file, overriding the configured path
    #[arg(long, global = true)]
    pub database: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Encrypt a secret into the blob format the vault stores
    Encrypt {
        /// Secret text (omit or use '-' to read stdin)
        secret: Option<String>,

        /// Encryption key/password
        #[arg(short, long)]
        key: String,

        /// Output format: json (blob only) or curl (example request)
        #[arg(short, long, default_value = "json")]
        output: String,

        /// Base URL of the sharepass server
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },

    /// Store an encrypted blob and print its unlock link
    Lock {
        /// File containing the blob (omit or use '-' to read stdin)
        file: Option<String>,

        /// Caller's network address, used for quota accounting
        #[arg(long)]
        ip: String,

        /// X-Forwarded-For value, if the caller came through a proxy
        #[arg(long)]
        forwarded_for: Option<String>,
    },

    /// Exchange a download code and key for the secret
    Unlock {
        /// Download code
        code: String,
    },

    /// Check whether a download code exists, without using an attempt
    Peek {
        /// Download code
        code: String,
    },

    /// Show how long a secret has before it expires
    TimeLeft {
        /// Download code
        code: String,
    },

    /// Show remaining shares and time until the quota renews
    CheckLimit {
        /// Caller's network address
        #[arg(long)]
        ip: String,

        /// X-Forwarded-For value, if the caller came through a proxy
        #[arg(long)]
        forwarded_for: Option<String>,
    },

    /// Remove expired secrets and stale quota entries once
    Purge,

    /// Run the periodic purger until interrupted
    Purger,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from `--config-dir`, applying `--database` on top.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(Path::new(&cli.config_dir))?;
    if let Some(db) = &cli.database {
        settings.database_path = db.clone();
    }
    Ok(settings)
}

/// Open the configured database and assemble the service.
pub fn open_service(cli: &Cli) -> Result<SharePass> {
    let settings = load_settings(cli)?;
    SharePass::open(&settings, &config_dir(cli))
}

/// The config directory as a path.
pub fn config_dir(cli: &Cli) -> PathBuf {
    PathBuf::from(&cli.config_dir)
}

/// Identity token from the `--ip` / `--forwarded-for` pair.
pub fn identity(ip: &str, forwarded_for: Option<&str>) -> Result<IdentityToken> {
    if ip.trim().is_empty() {
        return Err(SharePassError::InvalidFormat("--ip cannot be empty".into()));
    }
    Ok(client_identity(forwarded_for, ip.trim()))
}

/// Read a positional argument, a file, or stdin.
///
/// `None` and `"-"` mean stdin.  Trailing newlines are stripped.
pub fn read_input(source: Option<&str>, from_file: bool) -> Result<String> {
    let raw = match source {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) if from_file => std::fs::read_to_string(path)?,
        Some(text) => text.to_string(),
    };
    Ok(raw.trim_end_matches(['\r', '\n']).to_string())
}

/// Get the unlock key, trying in order:
/// 1. `SHAREPASS_KEY` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the key is wiped from memory on drop.
pub fn prompt_key() -> Result<Zeroizing<String>> {
    if let Ok(key) = std::env::var("SHAREPASS_KEY") {
        if !key.is_empty() {
            return Ok(Zeroizing::new(key));
        }
    }

    if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(Zeroizing::new(buf.trim_end_matches(['\r', '\n']).to_string()));
    }

    let key = dialoguer::Password::new()
        .with_prompt("Enter decryption key")
        .interact()
        .map_err(|e| SharePassError::CommandFailed(format!("key prompt: {e}")))?;
    Ok(Zeroizing::new(key))
}
