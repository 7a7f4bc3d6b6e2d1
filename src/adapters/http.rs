use crate::domain::model::{
    Candidate, ExternalRecord, HierarchyNode, LocalRecord, RawCandidate, SearchMode, SyncReport,
};
use crate::domain::ports::{ClassificationGateway, ConfigProvider};
use crate::utils::error::{Result, TrackerError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

/// The proxy forwards the authority's payload, which is either a bare list
/// or an object wrapping one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExternalResponse {
    List(Vec<ExternalRecord>),
    Wrapped {
        #[serde(default)]
        results: Vec<ExternalRecord>,
    },
}

impl ExternalResponse {
    fn into_records(self) -> Vec<ExternalRecord> {
        match self {
            ExternalResponse::List(records) => records,
            ExternalResponse::Wrapped { results } => results,
        }
    }
}

/// Talks JSON over HTTP to the classification backend.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base: Url,
    client: Client,
}

impl HttpGateway {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds() {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        Self::with_client(config.api_base(), client)
    }

    pub fn with_client(api_base: &str, client: Client) -> Result<Self> {
        crate::utils::validation::validate_url("api.base_url", api_base)?;

        // Url::join drops the last path segment unless the base ends with '/'
        let normalized = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{}/", api_base)
        };
        let base = Url::parse(&normalized).map_err(|e| TrackerError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: api_base.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| TrackerError::ConfigError {
                message: format!("cannot build URL for '{}': {}", path, e),
            })
    }

    fn query_url(&self, path: &str, query: &str) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(TrackerError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn try_search_local(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = self.query_url(SearchMode::Local.endpoint(), query)?;
        let records: Vec<LocalRecord> = self.get_json(url).await?;
        Ok(records
            .into_iter()
            .map(|r| Candidate::from(RawCandidate::Local(r)))
            .collect())
    }

    async fn try_search_external(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = self.query_url(SearchMode::External.endpoint(), query)?;
        let response: ExternalResponse = self.get_json(url).await?;
        Ok(response
            .into_records()
            .into_iter()
            .map(|r| Candidate::from(RawCandidate::External(r)))
            .collect())
    }

    async fn try_fetch_tree(&self) -> Result<Vec<HierarchyNode>> {
        let url = self.endpoint("tree")?;
        self.get_json(url).await
    }
}

#[async_trait]
impl ClassificationGateway for HttpGateway {
    async fn search_local(&self, query: &str) -> Vec<Candidate> {
        match self.try_search_local(query).await {
            Ok(candidates) => {
                tracing::info!("Local search '{}' returned {} candidates", query, candidates.len());
                candidates
            }
            Err(e) => {
                tracing::error!("Error fetching local search results: {}", e);
                Vec::new()
            }
        }
    }

    async fn search_external(&self, query: &str) -> Vec<Candidate> {
        match self.try_search_external(query).await {
            Ok(candidates) => {
                tracing::info!(
                    "External search '{}' returned {} candidates",
                    query,
                    candidates.len()
                );
                candidates
            }
            Err(e) => {
                tracing::error!("Error fetching external search results: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_tree(&self) -> Vec<HierarchyNode> {
        match self.try_fetch_tree().await {
            Ok(nodes) => {
                tracing::info!("Loaded hierarchy with {} top-level nodes", nodes.len());
                nodes
            }
            Err(e) => {
                tracing::error!("Failed to load tree: {}", e);
                Vec::new()
            }
        }
    }

    async fn sync_file(&self, file_name: &str, content: Vec<u8>) -> Result<SyncReport> {
        let url = self.endpoint("sync")?;
        tracing::debug!("POST {} ({} bytes, file '{}')", url, content.len(), file_name);

        let part = Part::bytes(content).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self.client.post(url.clone()).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::error!("Error uploading '{}': HTTP {}", file_name, status);
            return Err(TrackerError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        let report: SyncReport = serde_json::from_slice(&body)?;
        tracing::info!("Sync result: {} rows processed", report.rows);
        Ok(report)
    }
}
