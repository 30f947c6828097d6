//! HTTP implementation of the session API
//!
//! Thin reqwest wrapper over the backend's REST surface. Errors carry the
//! server's status and body text; no retry policy lives here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    AlgorithmInfo, AnalysisMethod, AnalysisSummary, ApiError, ApplyResult, FsEntry, JobProgress, MethodInfo,
    PlanSummary, PreviewTree, Session, SessionApi, StructAlgorithm,
};
use crate::config::ApiConfig;

/// Session backend client over HTTP
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    base_url: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    directory: &'a str,
    recursive: bool,
}

#[derive(Debug, Serialize)]
struct AnalysisRequest {
    method: AnalysisMethod,
}

#[derive(Debug, Serialize)]
struct PlanRequest {
    algorithm: StructAlgorithm,
}

#[derive(Debug, Serialize)]
struct ApplyRequest {
    dry_run: bool,
}

#[derive(Debug, serde::Deserialize)]
struct FsEntriesResponse {
    #[serde(default)]
    entries: Vec<FsEntry>,
}

impl HttpSessionApi {
    /// Create a client against a base URL (e.g. `http://localhost:8000/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;
        Ok(Self { base_url, http })
    }

    /// Create a client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), Duration::from_millis(config.timeout_ms))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        debug!(path, "HttpSessionApi: GET");
        let response = self.http.get(self.url(path)).query(query).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        debug!(path, "HttpSessionApi: POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "HttpSessionApi: error response");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn create_session(&self, directory: &str, recursive: bool) -> Result<Session, ApiError> {
        self.post_json("/sessions/", &CreateSessionRequest { directory, recursive }).await
    }

    async fn get_session(&self, id: &str) -> Result<Session, ApiError> {
        self.get_json(&format!("/sessions/{id}"), &[]).await
    }

    async fn list_sessions(&self, skip: u32, limit: u32) -> Result<Vec<Session>, ApiError> {
        self.get_json("/sessions/", &[("skip", skip.to_string()), ("limit", limit.to_string())])
            .await
    }

    async fn run_analysis(&self, id: &str, method: AnalysisMethod) -> Result<AnalysisSummary, ApiError> {
        self.post_json(&format!("/sessions/{id}/analyze"), &AnalysisRequest { method }).await
    }

    async fn generate_plan(&self, id: &str, algorithm: StructAlgorithm) -> Result<PlanSummary, ApiError> {
        self.post_json(&format!("/sessions/{id}/plan"), &PlanRequest { algorithm }).await
    }

    async fn get_preview(&self, id: &str) -> Result<PreviewTree, ApiError> {
        self.get_json(&format!("/sessions/{id}/preview"), &[]).await
    }

    async fn apply_plan(&self, id: &str, dry_run: bool) -> Result<ApplyResult, ApiError> {
        self.post_json(&format!("/sessions/{id}/apply"), &ApplyRequest { dry_run }).await
    }

    async fn get_progress(&self, id: &str) -> Result<JobProgress, ApiError> {
        self.get_json(&format!("/sessions/{id}/progress"), &[]).await
    }

    async fn analysis_methods(&self) -> Result<Vec<MethodInfo>, ApiError> {
        self.get_json("/analysis-methods", &[]).await
    }

    async fn struct_algorithms(&self) -> Result<Vec<AlgorithmInfo>, ApiError> {
        self.get_json("/struct-algorithms", &[]).await
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<FsEntry>, ApiError> {
        let response: FsEntriesResponse = self.get_json("/fs/entries", &[("dir", path.to_string())]).await?;
        Ok(response.entries)
    }
}
