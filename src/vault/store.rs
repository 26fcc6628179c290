//! The vault: stores sealed secrets and hands each one out at most once.
//!
//! Lifecycle of a record: created with `attempts = 0`, then removed by
//! exactly one of a successful unlock, the last failed attempt, or the
//! expiry sweep.  Removal is a `DELETE` keyed by the record id, so when
//! two paths race for the same record one of them simply affects zero
//! rows and reports `NotFound`.
//!
//! Unlocking reads the record, runs the (slow) key derivation without
//! holding the database lock, then applies the outcome in one
//! transaction keyed by id.  The attempt counter is bumped with
//! `attempts = attempts + 1 … RETURNING attempts`, so concurrent wrong
//! guesses each see a distinct post-increment value and none is lost.

use std::sync::Arc;

use chrono::Duration;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::{Zeroize, Zeroizing};

use super::code::{generate_download_code, is_valid_download_code, redact};
use super::record::{SecretRecord, TimeRemaining, UnlockOutcome};
use crate::clock::Clock;
use crate::config::Limits;
use crate::crypto::{self, SealedBlob};
use crate::errors::{Result, SharePassError};
use crate::store::{from_millis, millis_range, to_count, to_millis, Database};

/// Fresh codes tried before giving up on a create.
const MAX_CODE_RETRIES: usize = 8;

/// Handle to the `secrets` table.
#[derive(Clone)]
pub struct VaultStore {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    limits: Limits,
}

impl VaultStore {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, limits: Limits) -> Self {
        Self { db, clock, limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Reject payloads over the configured maximum.
    pub fn check_size(&self, blob: &str) -> Result<()> {
        if blob.len() > self.limits.max_payload_bytes {
            return Err(SharePassError::SizeExceeded {
                size: blob.len(),
                max: self.limits.max_payload_bytes,
            });
        }
        Ok(())
    }

    /// Store a sealed blob and return its download code.
    ///
    /// The blob is not parsed here.  Quota is the caller's concern.
    pub fn create(&self, blob: &str) -> Result<String> {
        self.check_size(blob)?;

        let id = Uuid::new_v4().to_string();
        let upload_time = to_millis(self.clock.now());

        let code = self.db.transaction(|tx| {
            for _ in 0..MAX_CODE_RETRIES {
                let code = generate_download_code();
                let taken = tx
                    .query_row(
                        "SELECT 1 FROM secrets WHERE download_code = ?1",
                        [&code],
                        |_| Ok(()),
                    )
                    .optional()?
                    .is_some();
                if taken {
                    warn!("download code collision, regenerating");
                    continue;
                }

                tx.execute(
                    "INSERT INTO secrets (id, secret, attempts, download_code, upload_time)
                     VALUES (?1, ?2, 0, ?3, ?4)",
                    params![id, blob, code, upload_time],
                )?;
                return Ok(code);
            }

            Err(SharePassError::Storage(
                "could not allocate a unique download code".into(),
            ))
        })?;

        info!(code = redact(&code), size = blob.len(), "secret stored");
        Ok(code)
    }

    // ------------------------------------------------------------------
    // Read-only probes
    // ------------------------------------------------------------------

    /// Whether a live record exists for `code`.
    ///
    /// Malformed codes report `false` without querying.
    pub fn peek_exists(&self, code: &str) -> Result<bool> {
        if !is_valid_download_code(code) {
            return Ok(false);
        }

        self.db.read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT 1 FROM secrets WHERE download_code = ?1",
                    [code],
                    |_| Ok(()),
                )
                .optional()?
                .is_some())
        })
    }

    /// Time until `code` expires.
    pub fn time_remaining(&self, code: &str) -> Result<TimeRemaining> {
        let Some(record) = self.get(code)? else {
            return Ok(TimeRemaining::NotFound);
        };

        let expires_at = record
            .upload_time
            .checked_add_signed(self.limits.expiry)
            .ok_or_else(|| {
                SharePassError::Storage(format!(
                    "upload time {} has no representable expiry",
                    record.upload_time
                ))
            })?;

        let left = expires_at - self.clock.now();
        if left <= Duration::zero() {
            return Ok(TimeRemaining::Expired);
        }

        let secs = left.num_seconds();
        Ok(TimeRemaining::Available {
            hours: secs / 3600,
            minutes: (secs % 3600) / 60,
        })
    }

    /// Fetch the full record for `code`, if live.
    pub fn get(&self, code: &str) -> Result<Option<SecretRecord>> {
        if !is_valid_download_code(code) {
            return Ok(None);
        }

        let row = self.db.read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, secret, attempts, download_code, upload_time
                     FROM secrets WHERE download_code = ?1",
                    [code],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    },
                )
                .optional()?)
        })?;

        row.map(|(id, ciphertext_blob, attempts, download_code, upload_time)| -> Result<SecretRecord> {
            Ok(SecretRecord {
                id,
                ciphertext_blob,
                attempts: u32::try_from(attempts)
                    .map_err(|_| SharePassError::Storage(format!("bad attempt count {attempts}")))?,
                download_code,
                upload_time: from_millis(upload_time)?,
            })
        })
        .transpose()
    }

    /// Number of live records.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM secrets", [], |r| r.get(0))?))?;
        to_count(n)
    }

    /// Number of records whose `upload_time` lies outside the range a
    /// timestamp can represent.  Such rows never expire and never unlock.
    pub fn unreadable_count(&self) -> Result<usize> {
        let (min, max) = millis_range();
        let n: i64 = self.db.read(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM secrets WHERE upload_time < ?1 OR upload_time > ?2",
                [min, max],
                |r| r.get(0),
            )?)
        })?;
        to_count(n)
    }

    // ------------------------------------------------------------------
    // Unlock
    // ------------------------------------------------------------------

    /// Try to open the secret behind `code` with `password`.
    ///
    /// Storage failures surface as errors and never touch `attempts`.
    pub fn attempt_unlock(&self, code: &str, password: &str) -> Result<UnlockOutcome> {
        let Some(record) = self.get(code)? else {
            return Ok(UnlockOutcome::NotFound);
        };

        match self.open_record(&record.ciphertext_blob, password) {
            Some(plaintext) => self.consume(&record, plaintext),
            None => self.record_failure(&record),
        }
    }

    /// Parse and decrypt a stored blob.  Every failure collapses to `None`.
    fn open_record(&self, raw: &str, password: &str) -> Option<Zeroizing<String>> {
        let blob = match SealedBlob::parse(raw) {
            Ok(blob) => blob,
            Err(e) => {
                debug!(error = %e, "stored blob does not parse");
                return None;
            }
        };

        let mut bytes =
            crypto::open_blob(&blob, password.as_bytes(), self.limits.kdf_iterations).ok()?;

        match String::from_utf8(std::mem::take(&mut *bytes)) {
            Ok(text) => Some(Zeroizing::new(text)),
            Err(e) => {
                let mut raw = e.into_bytes();
                raw.zeroize();
                None
            }
        }
    }

    fn consume(&self, record: &SecretRecord, plaintext: Zeroizing<String>) -> Result<UnlockOutcome> {
        let removed = self.db.transaction(|tx| {
            Ok(tx.execute("DELETE FROM secrets WHERE id = ?1", [&record.id])?)
        })?;

        if removed == 0 {
            // Consumed, exhausted or swept while we were decrypting.
            return Ok(UnlockOutcome::NotFound);
        }

        info!(code = redact(&record.download_code), "secret unlocked and destroyed");
        Ok(UnlockOutcome::Unlocked { plaintext })
    }

    fn record_failure(&self, record: &SecretRecord) -> Result<UnlockOutcome> {
        let max_attempts = self.limits.max_attempts;

        let outcome = self.db.transaction(|tx| {
            let attempts: Option<i64> = tx
                .query_row(
                    "UPDATE secrets SET attempts = attempts + 1 WHERE id = ?1 RETURNING attempts",
                    [&record.id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(attempts) = attempts else {
                return Ok(UnlockOutcome::NotFound);
            };

            if attempts >= i64::from(max_attempts) {
                tx.execute("DELETE FROM secrets WHERE id = ?1", [&record.id])?;
                return Ok(UnlockOutcome::Exhausted);
            }

            let remaining = i64::from(max_attempts) - attempts;
            Ok(UnlockOutcome::WrongKey {
                attempts_remaining: u32::try_from(remaining).unwrap_or(0),
            })
        })?;

        match &outcome {
            UnlockOutcome::Exhausted => {
                warn!(code = redact(&record.download_code), "attempts exhausted, secret destroyed")
            }
            UnlockOutcome::WrongKey { attempts_remaining } => debug!(
                code = redact(&record.download_code),
                attempts_remaining, "wrong key"
            ),
            _ => {}
        }

        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Expiry
    // ------------------------------------------------------------------

    /// Delete every record whose `upload_time + expiry` is in the past.
    ///
    /// Returns how many rows were removed.  Idempotent.
    pub fn purge_expired(&self) -> Result<usize> {
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(self.limits.expiry)
            .map(to_millis)
            .ok_or_else(|| {
                SharePassError::ConfigError("expiry reaches past the earliest timestamp".into())
            })?;

        let removed = self.db.transaction(|tx| {
            Ok(tx.execute("DELETE FROM secrets WHERE upload_time < ?1", [cutoff])?)
        })?;

        let unreadable = self.unreadable_count()?;
        if unreadable > 0 {
            warn!(unreadable, "secrets with out-of-range upload_time cannot be swept");
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn fast_limits() -> Limits {
        Limits {
            kdf_iterations: 1_000,
            ..Limits::default()
        }
    }

    fn vault() -> (VaultStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let db = Arc::new(Database::open_in_memory().unwrap());
        (VaultStore::new(db, clock.clone(), fast_limits()), clock)
    }

    fn sealed(plaintext: &str, password: &str) -> String {
        crypto::seal(plaintext.as_bytes(), password.as_bytes(), 1_000)
            .unwrap()
            .to_json()
            .unwrap()
    }

    #[test]
    fn create_rejects_oversized_payload_without_storing() {
        let (vault, _) = vault();
        let blob = "x".repeat(vault.limits().max_payload_bytes + 1);
        assert!(matches!(
            vault.create(&blob),
            Err(SharePassError::SizeExceeded { .. })
        ));
        assert_eq!(vault.count().unwrap(), 0);
    }

    #[test]
    fn payload_at_limit_is_accepted() {
        let (vault, _) = vault();
        let blob = "x".repeat(vault.limits().max_payload_bytes);
        assert!(vault.create(&blob).is_ok());
    }

    #[test]
    fn new_record_starts_with_zero_attempts() {
        let (vault, _) = vault();
        let code = vault.create(&sealed("s", "p")).unwrap();
        let record = vault.get(&code).unwrap().unwrap();
        assert_eq!(record.attempts, 0);
        assert_eq!(record.download_code, code);
    }

    #[test]
    fn time_remaining_counts_down_then_expires() {
        let (vault, clock) = vault();
        let code = vault.create(&sealed("s", "p")).unwrap();

        clock.advance(Duration::minutes(90));
        assert_eq!(
            vault.time_remaining(&code).unwrap(),
            TimeRemaining::Available {
                hours: 22,
                minutes: 30
            }
        );

        clock.advance(Duration::hours(23));
        assert_eq!(vault.time_remaining(&code).unwrap(), TimeRemaining::Expired);
        // Still present until swept.
        assert!(vault.peek_exists(&code).unwrap());
    }

    #[test]
    fn unparseable_blob_consumes_an_attempt() {
        let (vault, _) = vault();
        let code = vault.create("not a sealed blob").unwrap();
        let outcome = vault.attempt_unlock(&code, "anything").unwrap();
        assert_eq!(
            outcome,
            UnlockOutcome::WrongKey {
                attempts_remaining: 4
            }
        );
        assert_eq!(vault.get(&code).unwrap().unwrap().attempts, 1);
    }

    #[test]
    fn non_utf8_plaintext_counts_as_failure() {
        let (vault, _) = vault();
        let blob = crypto::seal(&[0xff, 0xfe, 0xfd], b"pw", 1_000)
            .unwrap()
            .to_json()
            .unwrap();
        let code = vault.create(&blob).unwrap();
        assert!(matches!(
            vault.attempt_unlock(&code, "pw").unwrap(),
            UnlockOutcome::WrongKey { .. }
        ));
    }

    #[test]
    fn purge_is_strictly_after_expiry() {
        let (vault, clock) = vault();
        let code = vault.create(&sealed("s", "p")).unwrap();

        clock.advance(vault.limits().expiry);
        assert_eq!(vault.purge_expired().unwrap(), 0);
        assert!(vault.peek_exists(&code).unwrap());

        clock.advance(Duration::milliseconds(1));
        assert_eq!(vault.purge_expired().unwrap(), 1);
        assert!(!vault.peek_exists(&code).unwrap());
    }

    fn insert_raw(vault: &VaultStore, code: &str, attempts: i64, upload_time: i64) {
        vault
            .db
            .transaction(|tx| {
                tx.execute(
                    "INSERT INTO secrets (id, secret, attempts, download_code, upload_time)
                     VALUES (?1, 'x', ?2, ?3, ?4)",
                    params![code, attempts, code, upload_time],
                )?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn time_remaining_past_the_end_of_time_is_a_storage_error() {
        let (vault, _) = vault();
        let (_, max) = millis_range();
        insert_raw(&vault, "AbC123xyZ789", 0, max);

        assert!(matches!(
            vault.time_remaining("AbC123xyZ789"),
            Err(SharePassError::Storage(_))
        ));
    }

    #[test]
    fn out_of_range_rows_survive_purge_and_are_counted() {
        let (vault, clock) = vault();
        insert_raw(&vault, "AbC123xyZ789", 0, i64::MAX);
        let code = vault.create(&sealed("s", "p")).unwrap();
        clock.advance(Duration::days(2));

        assert_eq!(vault.purge_expired().unwrap(), 1);
        assert!(!vault.peek_exists(&code).unwrap());
        assert!(vault.peek_exists("AbC123xyZ789").unwrap());
        assert_eq!(vault.unreadable_count().unwrap(), 1);
        assert_eq!(vault.count().unwrap(), 1);
    }

    #[test]
    fn purge_with_unrepresentable_cutoff_errors() {
        let clock = Arc::new(ManualClock::new(chrono::DateTime::<chrono::Utc>::MIN_UTC));
        let db = Arc::new(Database::open_in_memory().unwrap());
        let vault = VaultStore::new(db, clock, fast_limits());

        assert!(matches!(
            vault.purge_expired(),
            Err(SharePassError::ConfigError(_))
        ));
    }
}
