use crate::domain::model::{Candidate, HierarchyNode, SearchMode, SyncReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
}

/// Boundary to the remote classification service.
///
/// Searches and the tree fetch never fail from the caller's point of view:
/// transport and decode failures are logged and yield an empty result.
/// Only the upload relay reports errors, since the user has to see them.
#[async_trait]
pub trait ClassificationGateway: Send + Sync {
    async fn search_local(&self, query: &str) -> Vec<Candidate>;

    async fn search_external(&self, query: &str) -> Vec<Candidate>;

    async fn fetch_tree(&self) -> Vec<HierarchyNode>;

    async fn sync_file(&self, file_name: &str, content: Vec<u8>) -> Result<SyncReport>;

    async fn search(&self, mode: SearchMode, query: &str) -> Vec<Candidate> {
        match mode {
            SearchMode::Local => self.search_local(query).await,
            SearchMode::External => self.search_external(query).await,
        }
    }
}
