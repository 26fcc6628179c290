pub mod cli;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod identity;
pub mod purger;
pub mod quota;
pub mod service;
pub mod store;
pub mod vault;
