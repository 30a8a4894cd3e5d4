#[cfg(feature = "cli")]
pub mod cli;
pub mod lookup_config;

#[cfg(feature = "cli")]
pub use cli::{CliArgs, OutputFormat};
pub use lookup_config::LookupConfig;
