//! One module per subcommand.

pub mod check_limit;
pub mod encrypt;
pub mod lock;
pub mod peek;
pub mod purge;
pub mod time_left;
pub mod unlock;
