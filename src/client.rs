//! HTTP client for the hosted record store.
//!
//! Configuration comes from [`Config`](crate::config::Config):
//! - `ORYN_VOTE_URL` - Base URL (default: `http://localhost:17020/api/v1`)
//! - `ORYN_VOTE_API_KEY` - Bearer key (optional for local)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::DEFAULT_API_URL;
use crate::models::*;
use crate::repository::{FeatureRepository, RepositoryError};

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

impl From<ClientError> for RepositoryError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::NotFound(body) => RepositoryError::NotFound(body),
            other => RepositoryError::RemoteUnavailable(other.to_string()),
        }
    }
}

/// HTTP client for the record store API.
#[derive(Debug, Clone)]
pub struct FeatureClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl Default for FeatureClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, None)
    }
}

impl FeatureClient {
    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    /// Build a request with optional auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(status_error(status, response).await)
        }
    }

    // ============================================================
    // Feature Operations
    // ============================================================

    /// List all features, most votes first.
    pub async fn list_features(&self) -> Result<Vec<Feature>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/features")
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get a feature by ID.
    pub async fn get_feature(&self, id: &str) -> Result<Feature, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &feature_path(id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Update a feature.
    pub async fn update_feature(
        &self,
        id: &str,
        input: &UpdateFeatureInput,
    ) -> Result<Feature, ClientError> {
        let response = self
            .request(reqwest::Method::PUT, &feature_path(id))
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create a feature.
    pub async fn create_feature(&self, input: &CreateFeatureInput) -> Result<Feature, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/features")
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Submission and Board Operations
    // ============================================================

    /// Append a submission.
    pub async fn create_submission(
        &self,
        input: &CreateSubmissionInput,
    ) -> Result<Submission, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/submissions")
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// List board posts, newest first.
    pub async fn list_messages(&self) -> Result<Vec<Message>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/messages")
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Post to the board.
    pub async fn post_message(&self, input: &PostMessageInput) -> Result<Message, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/messages")
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl FeatureRepository for FeatureClient {
    async fn list(&self) -> Result<Vec<Feature>, RepositoryError> {
        Ok(self.list_features().await?)
    }

    /// Read the current tally, then write it back plus one.
    ///
    /// Two visitors voting at the same moment can both read the same tally,
    /// and one of the votes is lost.
    async fn increment_vote(&self, feature_id: &str) -> Result<u32, RepositoryError> {
        let current = self.get_feature(feature_id).await?;
        let next = next_vote_count(feature_id, current.vote_count)?;
        let updated = self
            .update_feature(feature_id, &UpdateFeatureInput::vote_count(next))
            .await?;
        Ok(updated.vote_count)
    }

    async fn submit(&self, input: CreateSubmissionInput) -> Result<(), RepositoryError> {
        self.create_submission(&input).await?;
        Ok(())
    }
}

fn next_vote_count(feature_id: &str, current: u32) -> Result<u32, RepositoryError> {
    current.checked_add(1).ok_or_else(|| {
        RepositoryError::RemoteUnavailable(format!(
            "Vote count for {} cannot go past {}",
            feature_id, current
        ))
    })
}

fn feature_path(id: &str) -> String {
    // Feature ids are slugs; anything else is percent-encoded as one path segment.
    let mut url = reqwest::Url::parse("http://placeholder/features/").expect("static url");
    url.path_segments_mut()
        .expect("http url has path segments")
        .pop_if_empty()
        .push(id);
    url.path().to_string()
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body),
        StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        _ => ClientError::Server(format!("{}: {}", status, body)),
    }
}
