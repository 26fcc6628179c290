//! Background expiry purger.
//!
//! Sweeps expired secrets and stale quota rows out of the database: once
//! at startup as a consistency pass, then on a fixed interval.  Every
//! deletion is the same keyed, idempotent `DELETE` the request paths
//! use, so a sweep racing an unlock or a create is harmless.  The task
//! holds no lock between ticks and stops when its `CancellationToken`
//! is cancelled.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::quota::QuotaTracker;
use crate::vault::VaultStore;

/// What one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub secrets_removed: usize,
    pub quota_removed: usize,
}

/// Run one sweep synchronously.
pub fn sweep(vault: &VaultStore, quota: &QuotaTracker) -> Result<SweepReport> {
    let report = SweepReport {
        secrets_removed: vault.purge_expired()?,
        quota_removed: quota.purge_stale()?,
    };

    if report.secrets_removed > 0 || report.quota_removed > 0 {
        info!(
            secrets_removed = report.secrets_removed,
            quota_removed = report.quota_removed,
            "purge sweep completed"
        );
    } else {
        debug!("purge sweep: nothing to remove");
    }

    Ok(report)
}

/// Spawn the periodic purger on the current tokio runtime.
///
/// The first sweep runs immediately.  Cancel the returned token to stop.
pub fn spawn_purger(
    vault: VaultStore,
    quota: QuotaTracker,
    every: Duration,
) -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        run_purge_loop(vault, quota, every, cancel_clone).await;
    });

    cancel
}

async fn run_purge_loop(
    vault: VaultStore,
    quota: QuotaTracker,
    every: Duration,
    cancel: CancellationToken,
) {
    // tokio's interval panics on a zero period.
    let mut ticker = interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_secs = every.as_secs(), "purger started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("purger shutting down");
                break;
            }
            _ = ticker.tick() => {
                run_sweep(&vault, &quota).await;
            }
        }
    }
}

/// Run a sweep on the blocking pool; failures are logged and retried
/// on the next tick.
async fn run_sweep(vault: &VaultStore, quota: &QuotaTracker) {
    let vault = vault.clone();
    let quota = quota.clone();

    match tokio::task::spawn_blocking(move || sweep(&vault, &quota)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!(error = %e, "purge sweep failed"),
        Err(e) => warn!(error = %e, "purge sweep task panicked"),
    }
}
