//! `sharepass purge` and `sharepass purger`: expiry sweeps.

use crate::cli::{open_service, output, Cli};
use crate::errors::{Result, SharePassError};

/// Execute the `purge` command: a single sweep.
pub fn execute_once(cli: &Cli) -> Result<()> {
    let service = open_service(cli)?;
    let report = service.sweep()?;
    output::success(&format!(
        "Removed {} expired secret(s) and {} stale quota entr{}.",
        report.secrets_removed,
        report.quota_removed,
        if report.quota_removed == 1 { "y" } else { "ies" }
    ));
    Ok(())
}

/// Execute the `purger` command: sweep on an interval until Ctrl-C.
pub fn execute_daemon(cli: &Cli) -> Result<()> {
    let service = open_service(cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let cancel = service.spawn_purger();
        output::info(&format!(
            "Purger running every {}s, press Ctrl-C to stop.",
            service.limits().purge_interval.as_secs()
        ));

        tokio::signal::ctrl_c().await?;
        cancel.cancel();
        output::success("Purger stopped.");
        Ok::<(), SharePassError>(())
    })
}
