//! Entry points for whatever front end drives SharePass (HTTP handlers,
//! the CLI).  Wires the quota tracker in front of the vault and turns
//! request-level problems into `SharePassError`s.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::{Limits, Settings};
use crate::errors::{Result, SharePassError};
use crate::identity::IdentityToken;
use crate::purger::{self, SweepReport};
use crate::quota::{Admission, QuotaStatus, QuotaTracker};
use crate::store::Database;
use crate::vault::{TimeRemaining, UnlockOutcome, VaultStore};

/// Returned by a successful creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub code: String,
    /// Relative retrieval path, e.g. `/unlock/AbC123xyZ789`.
    pub path: String,
}

/// The assembled core: vault, quota tracker and their shared limits.
#[derive(Clone)]
pub struct SharePass {
    vault: VaultStore,
    quota: QuotaTracker,
    limits: Limits,
}

impl SharePass {
    /// Assemble from an open database and a clock.
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, limits: Limits) -> Self {
        Self {
            vault: VaultStore::new(db.clone(), clock.clone(), limits),
            quota: QuotaTracker::new(db, clock, limits),
            limits,
        }
    }

    /// Open the configured database file with the system clock.
    pub fn open(settings: &Settings, config_dir: &Path) -> Result<Self> {
        let path = settings.database_path(config_dir);
        let db = Database::open(&path)?;
        info!(path = %path.display(), "database opened");
        Ok(Self::new(
            Arc::new(db),
            Arc::new(SystemClock),
            settings.limits(),
        ))
    }

    pub fn vault(&self) -> &VaultStore {
        &self.vault
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Store `blob` on behalf of `identity`.
    ///
    /// Order: size check, then atomic quota reservation, then storage.
    pub fn create_secret(&self, blob: &str, identity: &IdentityToken) -> Result<DownloadLink> {
        if blob.trim().is_empty() {
            return Err(SharePassError::InvalidFormat(
                "no secret payload provided".into(),
            ));
        }
        self.vault.check_size(blob)?;

        if self.quota.reserve(identity)? == Admission::Denied {
            return Err(SharePassError::QuotaExceeded {
                renewal_in: self.quota.time_to_renewal(identity)?,
            });
        }

        let code = self.vault.create(blob)?;
        let path = format!("/unlock/{code}");
        Ok(DownloadLink { code, path })
    }

    /// Whether the retrieval page should be shown for `code`.
    pub fn landing(&self, code: &str) -> Result<bool> {
        self.vault.peek_exists(code)
    }

    /// Exchange `code` and `password` for the plaintext.
    pub fn unlock(&self, code: &str, password: &str) -> Result<UnlockOutcome> {
        if code.is_empty() || password.is_empty() {
            return Err(SharePassError::InvalidFormat(
                "missing download code or key".into(),
            ));
        }
        self.vault.attempt_unlock(code, password)
    }

    pub fn time_left(&self, code: &str) -> Result<TimeRemaining> {
        self.vault.time_remaining(code)
    }

    pub fn check_limit(&self, identity: &IdentityToken) -> Result<QuotaStatus> {
        self.quota.status(identity)
    }

    /// One purge sweep, synchronously.
    pub fn sweep(&self) -> Result<SweepReport> {
        purger::sweep(&self.vault, &self.quota)
    }

    /// Start the periodic purger on the current tokio runtime.
    pub fn spawn_purger(&self) -> CancellationToken {
        purger::spawn_purger(
            self.vault.clone(),
            self.quota.clone(),
            self.limits.purge_interval,
        )
    }
}
