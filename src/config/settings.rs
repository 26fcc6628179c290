use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::limits::Limits;
use crate::errors::{Result, SharePassError};

/// Deployment configuration, loaded from `sharepass.toml`.
///
/// Every field has a default matching the stock deployment so SharePass
/// works without any config file at all.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Secret creations allowed per identity within one renewal window.
    #[serde(default = "default_max_uses_quota")]
    pub max_uses_quota: u32,

    /// Length of the quota window in minutes.
    #[serde(default = "default_quota_renewal_minutes")]
    pub quota_renewal_minutes: u32,

    /// How long a secret lives before the purger removes it.
    #[serde(default = "default_secret_expiry_minutes")]
    pub secret_expiry_minutes: u32,

    /// Minutes between two purge sweeps.
    #[serde(default = "default_purge_interval_minutes")]
    pub purge_interval_minutes: u32,

    /// Failed unlock attempts before a secret is destroyed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Largest accepted sealed blob, in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// PBKDF2 iteration count. Must match whatever sealed the blobs.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// SQLite database file, relative to the config directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_max_uses_quota() -> u32 {
    5
}

fn default_quota_renewal_minutes() -> u32 {
    60
}

fn default_secret_expiry_minutes() -> u32 {
    1440 // 24 hours
}

fn default_purge_interval_minutes() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    5
}

fn default_max_payload_bytes() -> usize {
    65_536
}

fn default_kdf_iterations() -> u32 {
    crate::crypto::kdf::DEFAULT_ITERATIONS
}

fn default_database_path() -> String {
    "database/secrets.db".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_uses_quota: default_max_uses_quota(),
            quota_renewal_minutes: default_quota_renewal_minutes(),
            secret_expiry_minutes: default_secret_expiry_minutes(),
            purge_interval_minutes: default_purge_interval_minutes(),
            max_attempts: default_max_attempts(),
            max_payload_bytes: default_max_payload_bytes(),
            kdf_iterations: default_kdf_iterations(),
            database_path: default_database_path(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the config directory.
    const FILE_NAME: &'static str = "sharepass.toml";

    /// Load settings from `<config_dir>/sharepass.toml`, then apply
    /// environment overrides and validate.
    ///
    /// If the file does not exist, defaults are used.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let mut settings = Self::load_file(config_dir)?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load only the TOML file, without environment overrides.
    pub fn load_file(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SharePassError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Override fields from variables such as `MAX_USES_QUOTA`.
    ///
    /// `lookup` returns the raw value of a variable, if set.  Blank
    /// values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        override_number(&get, "MAX_USES_QUOTA", &mut self.max_uses_quota)?;
        override_number(
            &get,
            "QUOTA_RENEWAL_MINUTES",
            &mut self.quota_renewal_minutes,
        )?;
        override_number(
            &get,
            "SECRET_EXPIRY_MINUTES",
            &mut self.secret_expiry_minutes,
        )?;
        override_number(
            &get,
            "PURGE_INTERVAL_MINUTES",
            &mut self.purge_interval_minutes,
        )?;
        override_number(&get, "MAX_ATTEMPTS", &mut self.max_attempts)?;
        override_number(&get, "MAX_PAYLOAD_BYTES", &mut self.max_payload_bytes)?;
        override_number(&get, "KDF_ITERATIONS", &mut self.kdf_iterations)?;

        if let Some(path) = get("DATABASE_PATH") {
            self.database_path = path;
        }

        Ok(())
    }

    /// Reject settings that would make the vault unusable.
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, u64); 7] = [
            ("max_uses_quota", u64::from(self.max_uses_quota)),
            ("quota_renewal_minutes", u64::from(self.quota_renewal_minutes)),
            ("secret_expiry_minutes", u64::from(self.secret_expiry_minutes)),
            ("purge_interval_minutes", u64::from(self.purge_interval_minutes)),
            ("max_attempts", u64::from(self.max_attempts)),
            ("max_payload_bytes", self.max_payload_bytes as u64),
            ("kdf_iterations", u64::from(self.kdf_iterations)),
        ];

        for (name, value) in checks {
            if value == 0 {
                return Err(SharePassError::ConfigError(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        if self.database_path.trim().is_empty() {
            return Err(SharePassError::ConfigError(
                "database_path cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Resolve the database file against the config directory.
    ///
    /// Absolute paths are returned unchanged.
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        let path = Path::new(&self.database_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }

    /// Convert into the limits the core components run with.
    pub fn limits(&self) -> Limits {
        Limits {
            max_uses: self.max_uses_quota,
            renewal_window: chrono::Duration::minutes(i64::from(self.quota_renewal_minutes)),
            expiry: chrono::Duration::minutes(i64::from(self.secret_expiry_minutes)),
            purge_interval: std::time::Duration::from_secs(
                u64::from(self.purge_interval_minutes) * 60,
            ),
            max_attempts: self.max_attempts,
            max_payload_bytes: self.max_payload_bytes,
            kdf_iterations: self.kdf_iterations,
        }
    }
}

fn override_number<T, G>(get: &G, name: &str, slot: &mut T) -> Result<()>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(name) {
        *slot = raw.trim().parse().map_err(|_| {
            SharePassError::ConfigError(format!("{name} must be a non-negative integer, got '{raw}'"))
        })?;
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────
