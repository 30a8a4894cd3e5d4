pub mod cache;
pub mod endpoints;
pub mod fetcher;
pub mod lookup;
pub mod orchestrator;
pub mod resolver;

pub use crate::domain::jurisdiction::Jurisdiction;
pub use crate::domain::model::{Batch, LookupReport, Npn, Outcome, Record, StateResult};
pub use crate::domain::ports::JsonSource;
pub use crate::utils::error::Result;
