//! `sharepass time-left`: remaining lifetime of a secret.

use crate::cli::{open_service, output, Cli};
use crate::errors::{Result, SharePassError};
use crate::vault::TimeRemaining;

/// Execute the `time-left` command.
pub fn execute(cli: &Cli, code: &str) -> Result<()> {
    let service = open_service(cli)?;

    match service.time_left(code)? {
        TimeRemaining::Available { hours, minutes } => {
            output::info(&format!(
                "The secret is available: {hours}h {minutes}m left"
            ));
            Ok(())
        }
        TimeRemaining::Expired => Err(SharePassError::CommandFailed(
            "The secret has already expired.".into(),
        )),
        TimeRemaining::NotFound => Err(SharePassError::CommandFailed(
            "Download code not found.".into(),
        )),
    }
}
