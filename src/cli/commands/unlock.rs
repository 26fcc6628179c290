//! `sharepass unlock`: exchange a code and key for the secret.

use crate::cli::{open_service, prompt_key, Cli};
use crate::errors::{Result, SharePassError};
use crate::vault::UnlockOutcome;

/// Execute the `unlock` command.
pub fn execute(cli: &Cli, code: &str) -> Result<()> {
    let service = open_service(cli)?;
    let key = prompt_key()?;

    match service.unlock(code, &key)? {
        UnlockOutcome::Unlocked { plaintext } => {
            println!("{}", plaintext.as_str());
            Ok(())
        }
        UnlockOutcome::WrongKey { attempts_remaining } => Err(SharePassError::CommandFailed(
            format!("Incorrect key: {attempts_remaining} attempt(s) remaining"),
        )),
        UnlockOutcome::Exhausted => Err(SharePassError::CommandFailed(
            "Incorrect key, no attempts left, the secret has been destroyed".into(),
        )),
        UnlockOutcome::NotFound => Err(SharePassError::NotFound),
    }
}
