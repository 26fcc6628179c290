//! `sharepass peek`: existence check that does not use an attempt.

use crate::cli::{open_service, output, Cli};
use crate::errors::{Result, SharePassError};

/// Execute the `peek` command.
pub fn execute(cli: &Cli, code: &str) -> Result<()> {
    let service = open_service(cli)?;

    if !service.landing(code)? {
        return Err(SharePassError::NotFound);
    }

    output::success(&format!(
        "Secret {code} is waiting ({} attempt(s) allowed).",
        service.limits().max_attempts
    ));
    Ok(())
}
