pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::http::HttpGateway;
pub use crate::app::session::Session;
pub use crate::app::state::{Event, SessionState};
pub use crate::config::Settings;
pub use crate::core::estimator::{estimate, Currency, DutyEstimate};
pub use crate::core::rate::{parse_rate, rate_fraction};
pub use crate::domain::model::{Candidate, HierarchyNode, SearchMode};
pub use crate::domain::ports::ClassificationGateway;
pub use crate::utils::error::{Result, TrackerError};
