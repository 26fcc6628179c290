//! `sharepass lock`: store a sealed blob and print its unlock link.

use crate::cli::{identity, open_service, output, read_input, Cli};
use crate::errors::Result;

/// Execute the `lock` command.
pub fn execute(cli: &Cli, file: Option<&str>, ip: &str, forwarded_for: Option<&str>) -> Result<()> {
    let who = identity(ip, forwarded_for)?;
    let blob = read_input(file, true)?;

    let service = open_service(cli)?;
    let link = service.create_secret(&blob, &who)?;

    println!("{}", link.path);

    let expiry = service.limits().expiry;
    output::success(&format!(
        "Secret locked. It expires in {}h {}m and allows {} attempt(s).",
        expiry.num_hours(),
        expiry.num_minutes() % 60,
        service.limits().max_attempts
    ));
    Ok(())
}
