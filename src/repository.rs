//! Remote feature store abstraction.
//!
//! The voting core only needs a handful of operations from wherever the
//! feature tallies live. [`FeatureClient`](crate::client::FeatureClient)
//! talks to the hosted backend over HTTP; [`Database`](crate::db::Database)
//! implements the same trait in-process.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CreateSubmissionInput, Feature, SubmissionKind};

/// Failures from the remote store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Feature not found: {0}")]
    NotFound(String),
}

/// Read and update feature tallies in the remote store.
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    /// All features, most votes first, ties in creation order.
    async fn list(&self) -> Result<Vec<Feature>, RepositoryError>;

    /// Add one vote to `feature_id` and return the stored tally.
    async fn increment_vote(&self, feature_id: &str) -> Result<u32, RepositoryError>;

    /// Append a free-form submission.
    async fn submit(&self, input: CreateSubmissionInput) -> Result<(), RepositoryError>;

    /// Append a feature idea with an optional contact address.
    async fn submit_suggestion(
        &self,
        text: &str,
        contact_email: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.submit(CreateSubmissionInput {
            kind: SubmissionKind::Idea,
            content: text.to_string(),
            contact_email: contact_email.map(str::to_string),
        })
        .await
    }
}
