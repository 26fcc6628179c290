//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.  Machine-readable output
//! (blobs, secrets, links) is printed with plain `println!` instead.

use console::style;

use crate::quota::QuotaStatus;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the quota summary.
pub fn print_quota(status: &QuotaStatus) {
    if status.limit_reached {
        warning("Share limit reached.");
    }
    info(&format!(
        "{} share(s) left, renews in {}h {}m",
        status.remaining_uses,
        status.renewal_hours(),
        status.renewal_minutes()
    ));
}
