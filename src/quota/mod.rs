//! Quota tracker: per-identity creation limits over a renewal window.
//!
//! A record older than the window is stale and treated as absent.  It
//! is deleted lazily whenever an operation touches that identity, and in
//! bulk by the purger.  Renewal is a hard reset, never a decay.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

use crate::clock::Clock;
use crate::config::Limits;
use crate::errors::{Result, SharePassError};
use crate::identity::IdentityToken;
use crate::store::{from_millis, to_millis, Database};

/// Admission decision for one creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

/// One row of the `quota` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaRecord {
    pub identity: IdentityToken,
    pub uses: u32,
    pub last_access: DateTime<Utc>,
}

/// What the quota-check entry point reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub limit_reached: bool,
    pub remaining_uses: u32,
    pub renewal_in: Duration,
}

impl QuotaStatus {
    pub fn renewal_hours(&self) -> i64 {
        self.renewal_in.num_seconds() / 3600
    }

    pub fn renewal_minutes(&self) -> i64 {
        (self.renewal_in.num_seconds() % 3600) / 60
    }
}

/// Handle to the `quota` table.
#[derive(Clone)]
pub struct QuotaTracker {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    limits: Limits,
}

impl QuotaTracker {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, limits: Limits) -> Self {
        Self { db, clock, limits }
    }

    /// Decide whether `identity` may create another secret.
    ///
    /// Does not count a use; pair with `record_use`, or call `reserve`
    /// to do both atomically.
    pub fn admit(&self, identity: &IdentityToken) -> Result<Admission> {
        let now = self.clock.now();
        self.db
            .transaction(|tx| Ok(self.decide(self.load_live(tx, identity, now)?.as_ref())))
    }

    /// Count one creation against `identity`.
    pub fn record_use(&self, identity: &IdentityToken) -> Result<()> {
        let now = self.clock.now();
        self.db.transaction(|tx| {
            let live = self.load_live(tx, identity, now)?;
            self.bump(tx, identity, live.as_ref(), now)
        })
    }

    /// Admit and, if allowed, count the use, as one atomic step.
    pub fn reserve(&self, identity: &IdentityToken) -> Result<Admission> {
        let now = self.clock.now();
        let admission = self.db.transaction(|tx| {
            let live = self.load_live(tx, identity, now)?;
            let admission = self.decide(live.as_ref());
            if admission == Admission::Allowed {
                self.bump(tx, identity, live.as_ref(), now)?;
            }
            Ok(admission)
        })?;

        if admission == Admission::Denied {
            debug!("quota denied");
        }
        Ok(admission)
    }

    /// Time until the identity's window resets, clamped at zero.
    ///
    /// With no live record the full window is reported.
    pub fn time_to_renewal(&self, identity: &IdentityToken) -> Result<Duration> {
        Ok(self.status(identity)?.renewal_in)
    }

    /// Remaining uses, renewal countdown and whether the limit is hit.
    pub fn status(&self, identity: &IdentityToken) -> Result<QuotaStatus> {
        let now = self.clock.now();
        let live = self
            .db
            .transaction(|tx| self.load_live(tx, identity, now))?;

        let status = match live {
            None => QuotaStatus {
                limit_reached: false,
                remaining_uses: self.limits.max_uses,
                renewal_in: self.limits.renewal_window,
            },
            Some(record) => {
                let renews_at = record
                    .last_access
                    .checked_add_signed(self.limits.renewal_window)
                    .ok_or_else(|| {
                        SharePassError::Storage(format!(
                            "last access {} has no representable renewal",
                            record.last_access
                        ))
                    })?;
                let left = renews_at - now;
                QuotaStatus {
                    limit_reached: record.uses >= self.limits.max_uses,
                    remaining_uses: self.limits.max_uses.saturating_sub(record.uses),
                    renewal_in: left.max(Duration::zero()),
                }
            }
        };
        Ok(status)
    }

    /// Fetch the live record for `identity`, if any.
    pub fn get(&self, identity: &IdentityToken) -> Result<Option<QuotaRecord>> {
        let now = self.clock.now();
        self.db.transaction(|tx| self.load_live(tx, identity, now))
    }

    /// Delete every record whose `last_access + window` is in the past.
    pub fn purge_stale(&self) -> Result<usize> {
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(self.limits.renewal_window)
            .map(to_millis)
            .ok_or_else(|| {
                SharePassError::ConfigError(
                    "renewal window reaches past the earliest timestamp".into(),
                )
            })?;
        self.db.transaction(|tx| {
            Ok(tx.execute("DELETE FROM quota WHERE last_access < ?1", [cutoff])?)
        })
    }

    // ------------------------------------------------------------------
    // Helpers (always called inside a transaction)
    // ------------------------------------------------------------------

    fn decide(&self, live: Option<&QuotaRecord>) -> Admission {
        match live {
            Some(record) if record.uses >= self.limits.max_uses => Admission::Denied,
            _ => Admission::Allowed,
        }
    }

    /// Load the record, deleting it first if it has gone stale.
    fn load_live(
        &self,
        tx: &Transaction<'_>,
        identity: &IdentityToken,
        now: DateTime<Utc>,
    ) -> Result<Option<QuotaRecord>> {
        let row: Option<(i64, i64)> = tx
            .query_row(
                "SELECT uses, last_access FROM quota WHERE identity = ?1",
                [identity.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((uses, last_access)) = row else {
            return Ok(None);
        };

        let last_access = from_millis(last_access)?;
        if now - last_access >= self.limits.renewal_window {
            tx.execute("DELETE FROM quota WHERE identity = ?1", [identity.as_str()])?;
            return Ok(None);
        }

        Ok(Some(QuotaRecord {
            identity: identity.clone(),
            uses: u32::try_from(uses).unwrap_or(u32::MAX),
            last_access,
        }))
    }

    fn bump(
        &self,
        tx: &Transaction<'_>,
        identity: &IdentityToken,
        live: Option<&QuotaRecord>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = to_millis(now);
        match live {
            None => {
                tx.execute(
                    "INSERT INTO quota (identity, uses, last_access) VALUES (?1, 1, ?2)
                     ON CONFLICT (identity) DO UPDATE SET uses = 1, last_access = excluded.last_access",
                    params![identity.as_str(), now],
                )?;
            }
            Some(_) => {
                tx.execute(
                    "UPDATE quota SET uses = uses + 1, last_access = ?2 WHERE identity = ?1",
                    params![identity.as_str(), now],
                )?;
            }
        }
        Ok(())
    }
}
