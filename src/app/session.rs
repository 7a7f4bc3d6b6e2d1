use crate::app::state::{Command, Event, SessionState};
use crate::domain::model::SyncReport;
use crate::domain::ports::ClassificationGateway;
use crate::utils::error::Result;
use crate::utils::validation::validate_file_extension;
use std::collections::VecDeque;
use std::path::Path;

pub const UPLOAD_EXTENSIONS: [&str; 1] = ["xlsx"];

/// Reads a spreadsheet from disk and forwards it to the sync endpoint as is.
pub async fn relay_upload<G>(gateway: &G, path: &Path) -> Result<SyncReport>
where
    G: ClassificationGateway + ?Sized,
{
    let display = path.display().to_string();
    validate_file_extension("file", &display, &UPLOAD_EXTENSIONS)?;

    let content = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.xlsx")
        .to_string();

    tracing::info!("Uploading '{}' ({} bytes)", file_name, content.len());
    gateway.sync_file(&file_name, content).await
}

/// Runs the commands produced by [`SessionState::apply`] against a gateway
/// and feeds their results back in as events.
pub struct Session<G: ClassificationGateway> {
    gateway: G,
    state: SessionState,
}

impl<G: ClassificationGateway> Session<G> {
    pub fn new(gateway: G, state: SessionState) -> Self {
        Self { gateway, state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub async fn dispatch(&mut self, event: Event) {
        let mut queue: VecDeque<Command> = self.state.apply(event).into();
        while let Some(command) = queue.pop_front() {
            let follow_up = self.run(command).await;
            queue.extend(self.state.apply(follow_up));
        }
    }

    async fn run(&self, command: Command) -> Event {
        match command {
            Command::Search {
                ticket,
                mode,
                query,
            } => Event::SearchCompleted {
                ticket,
                mode,
                results: self.gateway.search(mode, &query).await,
            },
            Command::LoadTree => Event::TreeLoaded(self.gateway.fetch_tree().await),
            Command::Upload { path } => Event::UploadFinished(
                relay_upload(&self.gateway, &path)
                    .await
                    .map_err(|e| e.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::View;
    use crate::domain::model::{Candidate, HierarchyNode, SearchMode};
    use crate::utils::error::TrackerError;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockGateway {
        calls: Arc<Mutex<Vec<String>>>,
        fail_sync: bool,
    }

    #[async_trait]
    impl ClassificationGateway for MockGateway {
        async fn search_local(&self, query: &str) -> Vec<Candidate> {
            self.calls.lock().await.push(format!("local:{}", query));
            vec![Candidate::new("8471.30.01", "Laptops").with_duty_rate("2.5%")]
        }

        async fn search_external(&self, query: &str) -> Vec<Candidate> {
            self.calls.lock().await.push(format!("external:{}", query));
            Vec::new()
        }

        async fn fetch_tree(&self) -> Vec<HierarchyNode> {
            self.calls.lock().await.push("tree".to_string());
            vec![HierarchyNode::new("Chapter 84", Some("84"))]
        }

        async fn sync_file(&self, file_name: &str, content: Vec<u8>) -> Result<SyncReport> {
            self.calls
                .lock()
                .await
                .push(format!("sync:{}:{}", file_name, content.len()));
            if self.fail_sync {
                Err(TrackerError::HttpStatus {
                    status: 400,
                    url: "http://test/api/sync".to_string(),
                })
            } else {
                Ok(SyncReport {
                    rows: 4,
                    status: None,
                })
            }
        }
    }

    #[tokio::test]
    async fn test_start_loads_results_and_tree() {
        let gateway = MockGateway::default();
        let mut session = Session::new(gateway.clone(), SessionState::default());

        session.dispatch(Event::Started).await;

        assert_eq!(*gateway.calls.lock().await, vec!["local:", "tree"]);
        assert!(matches!(session.state().view(), View::Tree(Some(_))));
        assert_eq!(session.state().local_results().len(), 1);
    }

    #[tokio::test]
    async fn test_tab_switch_goes_to_external_endpoint() {
        let gateway = MockGateway::default();
        let mut session = Session::new(gateway.clone(), SessionState::default());

        session
            .dispatch(Event::SearchSubmitted("laptop".to_string()))
            .await;
        session
            .dispatch(Event::TabSwitched(SearchMode::External))
            .await;

        let calls = gateway.calls.lock().await.clone();
        assert_eq!(calls, vec!["local:laptop", "external:laptop"]);
        assert!(matches!(
            session.state().view(),
            View::ExternalResults { results, query_issued: true } if results.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_upload_success_and_failure_notices() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"PK\x03\x04fake").unwrap();

        let mut session = Session::new(MockGateway::default(), SessionState::default());
        session
            .dispatch(Event::UploadRequested(file.path().to_path_buf()))
            .await;
        assert_eq!(
            session.state_mut().take_notice().as_deref(),
            Some("Sync Complete! Processed 4 rows.")
        );

        let failing = MockGateway {
            fail_sync: true,
            ..Default::default()
        };
        let mut session = Session::new(failing, SessionState::default());
        session
            .dispatch(Event::UploadRequested(file.path().to_path_buf()))
            .await;
        assert_eq!(
            session.state_mut().take_notice().as_deref(),
            Some("Error uploading file")
        );
    }

    #[tokio::test]
    async fn test_relay_rejects_wrong_extension() {
        let gateway = MockGateway::default();
        let result = relay_upload(&gateway, Path::new("tariffs.csv")).await;
        assert!(result.is_err());
        assert!(gateway.calls.lock().await.is_empty());
    }
}
