//! HTTP client for the external analysis service.
//!
//! Endpoints:
//!
//! - `GET  /files?repo_url=<url>&branch=<branch>` lists discoverable source files
//! - `POST /analyze` analyzes one file (the service picks it unless `specific_file` is set)
//! - `POST /analyze-bulk` analyzes every discovered file
//! - `GET  /health` reachability probe
//!
//! Every failure is normalized into [`AnalysisError`] here so callers only
//! ever deal with one message per failed attempt. Nothing is retried.

use crate::models::{
    AnalysisResponse, AnalyzeRequest, BulkAnalysisResponse, BulkAnalyzeRequest, ErrorBody,
    FileInfo, FilesResponse,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const GENERIC_ERROR: &str = "An error occurred";
pub const DETAILS_UNAVAILABLE: &str =
    "File details not available. Please go back and select the file again.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("service returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("no analyzable file found in {0}")]
    NotFound(String),

    #[error("hand-off record missing or stale for {0}")]
    DetailsUnavailable(String),
}

impl AnalysisError {
    /// The single human-readable string shown on a failed view.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::Transport(_) | Self::Decode(_) => GENERIC_ERROR.to_string(),
            Self::Timeout(secs) => format!("The analysis service did not answer within {secs}s"),
            Self::Server { message, .. } => message.clone(),
            Self::NotFound(_) => "No analyzable file was found in the repository".to_string(),
            Self::DetailsUnavailable(_) => DETAILS_UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Files,
    Analyze,
    AnalyzeFile,
    AnalyzeBulk,
    Health,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Analyze | Self::AnalyzeFile => "analyze",
            Self::AnalyzeBulk => "analyze-bulk",
            Self::Health => "health",
        }
    }

    /// Used when a non-2xx response carries no usable `detail`.
    fn generic_failure(self) -> &'static str {
        match self {
            Self::Files => "Failed to list repository files",
            Self::Analyze => "Failed to analyze repository",
            Self::AnalyzeFile => "Failed to analyze file",
            Self::AnalyzeBulk => "Failed to perform bulk analysis",
            Self::Health => "Analysis service is unhealthy",
        }
    }
}

/// The file listing together with the service's pick of the main file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryResults {
    pub files: Vec<FileInfo>,
    pub analysis: AnalysisResponse,
}

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Analysis service URL is required".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        Ok(Self {
            base_url,
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    pub async fn health(&self) -> Result<(), AnalysisError> {
        let response = self
            .client
            .get(self.endpoint(Endpoint::Health))
            .send()
            .await
            .map_err(|e| self.to_transport_error(e))?;
        let _: serde_json::Value = self.decode(response, Endpoint::Health).await?;
        Ok(())
    }

    pub async fn list_files(
        &self,
        repo_url: &str,
        branch: &str,
    ) -> Result<Vec<FileInfo>, AnalysisError> {
        let repo_url = require_repo(repo_url)?;
        let mut query = vec![("repo_url", repo_url)];
        if !branch.is_empty() {
            query.push(("branch", branch));
        }
        let url = self.endpoint(Endpoint::Files);
        debug!("GET {} repo_url={} branch={:?}", url, repo_url, branch);
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| self.to_transport_error(e))?;
        let listing: FilesResponse = self.decode(response, Endpoint::Files).await?;
        info!("{} files discovered in {}", listing.files.len(), repo_url);
        Ok(listing.files)
    }

    pub async fn analyze(
        &self,
        repo_url: &str,
        branch: &str,
        specific_file: Option<&str>,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let request = AnalyzeRequest {
            repo_url: require_repo(repo_url)?.to_string(),
            branch: branch.to_string(),
            specific_file: specific_file.map(str::to_string),
        };
        let endpoint = match specific_file {
            Some(_) => Endpoint::AnalyzeFile,
            None => Endpoint::Analyze,
        };
        let url = self.endpoint(endpoint);
        info!("POST {} for {}", url, request.repo_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.to_transport_error(e))?;
        let analysis: AnalysisResponse = self.decode(response, endpoint).await?;
        if !analysis.analyzed_file_found {
            return Err(AnalysisError::NotFound(request.repo_url));
        }
        Ok(analysis)
    }

    pub async fn analyze_bulk(
        &self,
        repo_url: &str,
        branch: &str,
    ) -> Result<BulkAnalysisResponse, AnalysisError> {
        let request = BulkAnalyzeRequest {
            repo_url: require_repo(repo_url)?.to_string(),
            branch: branch.to_string(),
            bulk_analyze: true,
        };
        let url = self.endpoint(Endpoint::AnalyzeBulk);
        info!("POST {} for {}", url, request.repo_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.to_transport_error(e))?;
        let bulk: BulkAnalysisResponse = self.decode(response, Endpoint::AnalyzeBulk).await?;
        if bulk.analyzed_files.is_empty() {
            return Err(AnalysisError::NotFound(request.repo_url));
        }
        Ok(bulk)
    }

    /// Lists the repository, then runs the default single-file analysis.
    ///
    /// A listing rejected by the service only leaves the listing empty; a
    /// transport failure or a failed analysis ends the attempt.
    pub async fn load_repository(
        &self,
        repo_url: &str,
        branch: &str,
    ) -> Result<RepositoryResults, AnalysisError> {
        let files = match self.list_files(repo_url, branch).await {
            Ok(files) => files,
            Err(AnalysisError::Server { status, message }) => {
                warn!("file listing rejected ({}): {}", status, message);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let analysis = self.analyze(repo_url, branch, None).await?;
        Ok(RepositoryResults { files, analysis })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: Endpoint,
    ) -> Result<T, AnalysisError> {
        let status = response.status();
        debug!(
            "{} responded {} ({})",
            endpoint.path(),
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        let body = response
            .text()
            .await
            .map_err(|e| self.to_transport_error(e))?;
        if !status.is_success() {
            debug!("error body: {}", body);
            return Err(AnalysisError::Server {
                status: status.as_u16(),
                message: server_message(&body, endpoint),
            });
        }
        serde_json::from_str(&body).map_err(|e| AnalysisError::Decode(e.to_string()))
    }

    fn to_transport_error(&self, err: reqwest::Error) -> AnalysisError {
        if err.is_timeout() {
            AnalysisError::Timeout(self.timeout.as_secs())
        } else if err.is_decode() {
            AnalysisError::Decode(err.to_string())
        } else {
            AnalysisError::Transport(err.to_string())
        }
    }
}

fn require_repo(repo_url: &str) -> Result<&str, AnalysisError> {
    let trimmed = repo_url.trim();
    if trimmed.is_empty() {
        Err(AnalysisError::InvalidInput(
            "Repository URL is required".to_string(),
        ))
    } else {
        Ok(trimmed)
    }
}

fn server_message(body: &str, endpoint: Endpoint) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|detail| !detail.trim().is_empty())
        .unwrap_or_else(|| endpoint.generic_failure().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_detail() {
        assert_eq!(
            server_message(r#"{"detail":"repo not found"}"#, Endpoint::Analyze),
            "repo not found"
        );
    }

    #[test]
    fn server_message_falls_back_per_endpoint() {
        assert_eq!(
            server_message("<html>bad gateway</html>", Endpoint::Analyze),
            "Failed to analyze repository"
        );
        assert_eq!(
            server_message("<html>bad gateway</html>", Endpoint::AnalyzeFile),
            "Failed to analyze file"
        );
        assert_eq!(
            server_message(r#"{"detail":[{"msg":"field required"}]}"#, Endpoint::AnalyzeBulk),
            "Failed to perform bulk analysis"
        );
        assert_eq!(
            server_message(r#"{"detail":"  "}"#, Endpoint::Files),
            "Failed to list repository files"
        );
    }

    #[test]
    fn transport_failures_read_as_generic() {
        assert_eq!(
            AnalysisError::Transport("connection refused".to_string()).user_message(),
            "An error occurred"
        );
        assert_eq!(
            AnalysisError::Decode("expected value".to_string()).user_message(),
            "An error occurred"
        );
    }

    #[test]
    fn empty_repository_is_rejected_before_any_request() {
        assert!(matches!(require_repo("   "), Err(AnalysisError::InvalidInput(_))));
        assert_eq!(require_repo(" https://x/y.git ").unwrap(), "https://x/y.git");
    }

    #[test]
    fn base_url_is_normalized() {
        let client = AnalysisClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(Endpoint::AnalyzeBulk), "http://localhost:8000/analyze-bulk");
        assert!(AnalysisClient::new("", Duration::from_secs(5)).is_err());
    }
}
