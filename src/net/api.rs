//! REST client for the remote task service.
//!
//! DESIGN
//! ======
//! `TaskService` is the seam the board controller talks through; the
//! reqwest-backed `HttpTaskService` is the production implementation and
//! tests substitute in-process fakes. Each board owns one path prefix and
//! every operation takes the board explicitly, so a request always carries
//! the board it was issued for.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures, timeouts and non-2xx responses stay distinguishable
//! in `ApiError`; callers decide how uniformly to treat them. Bodies of
//! update and delete responses are read but never interpreted.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use async_trait::async_trait;

use super::types::{Board, DeleteRequest, Status, StatusUpdate, Task, TaskDraft, TaskId};
use crate::config::{ClientConfig, ClientTimeouts};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by task service calls.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success HTTP status.
    #[error("unexpected response status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// True for failures where the service never produced a response.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() { Self::Timeout } else { Self::Request(error.to_string()) }
    }
}

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// The four operations the remote service exposes per board.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// `GET {prefix}`
    async fn list(&self, board: Board) -> Result<Vec<Task>, ApiError>;

    /// `POST {prefix}`; the service assigns the id.
    async fn create(&self, board: Board, draft: &TaskDraft) -> Result<Task, ApiError>;

    /// `PUT {prefix}/update`
    async fn update_status(&self, board: Board, id: TaskId, status: Status) -> Result<(), ApiError>;

    /// `DELETE {prefix}/delete`
    async fn delete(&self, board: Board, id: TaskId) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpTaskService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTaskService {
    /// Build a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: ClientTimeouts) -> Result<Self, ApiError> {
        Self::build(base_url, timeouts, reqwest::Client::builder())
    }

    /// Like [`HttpTaskService::new`], but connects directly even when proxy
    /// environment variables are set. For services on the local host.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn direct(base_url: &str, timeouts: ClientTimeouts) -> Result<Self, ApiError> {
        Self::build(base_url, timeouts, reqwest::Client::builder().no_proxy())
    }

    fn build(base_url: &str, timeouts: ClientTimeouts, builder: reqwest::ClientBuilder) -> Result<Self, ApiError> {
        let http = builder
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// Build a client from a parsed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), body: text });
        }
        Ok(text)
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn list(&self, board: Board) -> Result<Vec<Task>, ApiError> {
        let url = collection_endpoint(&self.base_url, board);
        let text = self.send(self.http.get(url)).await?;
        parse_tasks(&text)
    }

    async fn create(&self, board: Board, draft: &TaskDraft) -> Result<Task, ApiError> {
        let url = collection_endpoint(&self.base_url, board);
        let text = self.send(self.http.post(url).json(draft)).await?;
        parse_task(&text)
    }

    async fn update_status(&self, board: Board, id: TaskId, status: Status) -> Result<(), ApiError> {
        let url = action_endpoint(&self.base_url, board, "update");
        let body = StatusUpdate { id, status };
        self.send(self.http.put(url).json(&body)).await?;
        Ok(())
    }

    async fn delete(&self, board: Board, id: TaskId) -> Result<(), ApiError> {
        let url = action_endpoint(&self.base_url, board, "delete");
        let body = DeleteRequest { id };
        self.send(self.http.delete(url).json(&body)).await?;
        Ok(())
    }
}

// =============================================================================
// ENDPOINTS & PARSING
// =============================================================================

fn collection_endpoint(base_url: &str, board: Board) -> String {
    format!("{base_url}{}", board.path_prefix())
}

fn action_endpoint(base_url: &str, board: Board, action: &str) -> String {
    format!("{base_url}{}/{action}", board.path_prefix())
}

fn parse_tasks(json: &str) -> Result<Vec<Task>, ApiError> {
    serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))
}

fn parse_task(json: &str) -> Result<Task, ApiError> {
    serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))
}
