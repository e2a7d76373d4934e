pub mod api;
pub mod brute;
pub mod collector;
pub mod concurrent;
pub mod config;
pub mod dispatcher;
pub mod dns;
pub mod error;
pub mod http_client;
pub mod model;
pub mod output;
pub mod postprocess;
pub mod utils;
pub mod validate;

pub use crate::api::{ScanOptions, ScanReport, SubHunter};
pub use crate::config::Config;
pub use crate::dispatcher::{DispatchOutcome, Dispatcher};
pub use crate::error::ScanError;
pub use crate::model::{SubdomainResult, ValidationResult};
