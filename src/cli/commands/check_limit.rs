//! `sharepass check-limit`: quota status for a caller.

use crate::cli::{identity, open_service, output, Cli};
use crate::errors::Result;

/// Execute the `check-limit` command.
pub fn execute(cli: &Cli, ip: &str, forwarded_for: Option<&str>) -> Result<()> {
    let who = identity(ip, forwarded_for)?;
    let service = open_service(cli)?;
    let status = service.check_limit(&who)?;
    output::print_quota(&status);
    Ok(())
}
