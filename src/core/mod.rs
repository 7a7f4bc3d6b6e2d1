pub mod estimator;
pub mod rate;
pub mod sequencer;

pub use crate::domain::model::{Candidate, HierarchyNode, SearchMode, SyncReport};
pub use crate::domain::ports::{ClassificationGateway, ConfigProvider};
pub use crate::utils::error::Result;
