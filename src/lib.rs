pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, OutputFormat};
pub use config::LookupConfig;

pub use crate::core::{
    cache::ResultCache,
    endpoints::Endpoints,
    fetcher::{RetryPolicy, RetryingFetcher},
    lookup::LookupService,
    orchestrator::BatchOrchestrator,
    resolver::JurisdictionResolver,
};
pub use domain::jurisdiction::Jurisdiction;
pub use domain::model::{Batch, LookupReport, Npn, Outcome, Record, StateResult};
pub use utils::error::{LookupError, Result};
pub use utils::logger::LogFormat;
