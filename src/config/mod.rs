//! Configuration: the on-disk `Settings` file and the `Limits` the core runs with.

pub mod limits;
pub mod settings;

pub use limits::Limits;
pub use settings::Settings;
