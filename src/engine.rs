//! Optimistic voting against the remote feature store.
//!
//! Each vote attempt moves through `Idle → Optimistic → {Committed | RolledBack}`:
//!
//! 1. The engine spends one unit of the local allowance and bumps the
//!    in-memory tally so the vote is visible immediately.
//! 2. It asks the repository to record the vote.
//! 3. On success the tally is overwritten with the authoritative count.
//!    On failure both the tally and the allowance are put back.
//!
//! Remote errors never escape [`VotingEngine::vote`]; they come back as a
//! [`VoteOutcome::RolledBack`] carrying a notice for the visitor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::allowance::AllowanceStore;
use crate::models::{rank_features, CreateSubmissionInput, Feature, SubmissionKind};
use crate::repository::{FeatureRepository, RepositoryError};

/// Where a feature's vote attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePhase {
    Idle,
    /// Counted locally, waiting on the remote store.
    Optimistic,
}

/// Result of a single [`VotingEngine::vote`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The remote store recorded the vote.
    Committed {
        feature_id: String,
        vote_count: u32,
        remaining: u32,
    },
    /// The remote store failed; the tally and allowance were restored.
    RolledBack {
        feature_id: String,
        remaining: u32,
        notice: String,
        error: RepositoryError,
    },
    /// No allowance left today. Nothing changed.
    Exhausted,
    /// A vote for this feature is still waiting on the remote store. Nothing changed.
    InFlight,
}

impl VoteOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Failures from [`VotingEngine::submit_suggestion`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{0}")]
    Empty(String),

    #[error(transparent)]
    Remote(#[from] RepositoryError),
}

#[derive(Default)]
struct EngineState {
    /// Last known features, in display order.
    features: Vec<Feature>,
    /// Features with a vote waiting on the remote store.
    in_flight: HashMap<String, PendingVote>,
}

/// A vote waiting on the remote store.
struct PendingVote {
    /// Whether the optimistic +1 is applied to the current `features`.
    counted: bool,
}

impl EngineState {
    fn feature_mut(&mut self, id: &str) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.id == id)
    }

    /// Apply the optimistic +1 for `id` if it is on the board and has room.
    fn count_pending(&mut self, id: &str) -> bool {
        let Some(feature) = self.feature_mut(id) else {
            return false;
        };
        match feature.vote_count.checked_add(1) {
            Some(count) => {
                feature.vote_count = count;
                true
            }
            None => false,
        }
    }

    /// Replace the board with a fresh remote listing.
    ///
    /// Remote counts do not include votes that are still pending, so their
    /// optimistic +1 is put back on top.
    fn replace_features(&mut self, features: Vec<Feature>) {
        self.features = features;
        let pending: Vec<String> = self.in_flight.keys().cloned().collect();
        for id in pending {
            let counted = self.count_pending(&id);
            if let Some(vote) = self.in_flight.get_mut(&id) {
                vote.counted = counted;
            }
        }
        rank_features(&mut self.features);
    }
}

/// Coordinates the local allowance, the in-memory leaderboard and the remote store.
///
/// The engine is `Send + Sync`; share it behind an `Arc` to vote on several
/// features concurrently. Its lock is never held across an `.await`.
pub struct VotingEngine {
    repository: Arc<dyn FeatureRepository>,
    allowance: AllowanceStore,
    state: Mutex<EngineState>,
}

impl VotingEngine {
    pub fn new(repository: Arc<dyn FeatureRepository>, allowance: AllowanceStore) -> Self {
        Self {
            repository,
            allowance,
            state: Mutex::new(EngineState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().expect("engine lock poisoned")
    }

    /// Reload the leaderboard from the remote store.
    ///
    /// On failure the previous (possibly empty) leaderboard is kept and the
    /// error is returned so the caller can show it as stale.
    pub async fn refresh(&self) -> Result<(), RepositoryError> {
        match self.repository.list().await {
            Ok(features) => {
                self.lock().replace_features(features);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Keeping stale leaderboard: {}", e);
                Err(e)
            }
        }
    }

    /// Snapshot of the leaderboard, most votes first.
    pub fn features(&self) -> Vec<Feature> {
        self.lock().features.clone()
    }

    pub fn remaining(&self) -> u32 {
        self.allowance.get_remaining()
    }

    /// Whether a vote on `feature_id` would be attempted right now.
    pub fn can_vote(&self, feature_id: &str) -> bool {
        self.phase(feature_id) == VotePhase::Idle && self.remaining() > 0
    }

    pub fn phase(&self, feature_id: &str) -> VotePhase {
        if self.lock().in_flight.contains_key(feature_id) {
            VotePhase::Optimistic
        } else {
            VotePhase::Idle
        }
    }

    /// Cast one vote for `feature_id`.
    pub async fn vote(&self, feature_id: &str) -> VoteOutcome {
        let spend = {
            let mut state = self.lock();
            if state.in_flight.contains_key(feature_id) {
                tracing::debug!("Vote for {} already in flight", feature_id);
                return VoteOutcome::InFlight;
            }
            let Some(spend) = self.allowance.spend() else {
                tracing::debug!("No allowance left for {}", feature_id);
                return VoteOutcome::Exhausted;
            };
            let counted = state.count_pending(feature_id);
            rank_features(&mut state.features);
            state
                .in_flight
                .insert(feature_id.to_string(), PendingVote { counted });
            spend
        };

        let result = self.repository.increment_vote(feature_id).await;

        let mut state = self.lock();
        let counted = state
            .in_flight
            .remove(feature_id)
            .is_some_and(|vote| vote.counted);
        match result {
            Ok(vote_count) => {
                if let Some(feature) = state.feature_mut(feature_id) {
                    feature.vote_count = vote_count;
                }
                rank_features(&mut state.features);
                tracing::info!("Vote for {} committed ({} total)", feature_id, vote_count);
                VoteOutcome::Committed {
                    feature_id: feature_id.to_string(),
                    vote_count,
                    remaining: self.allowance.get_remaining(),
                }
            }
            Err(error) => {
                if counted {
                    if let Some(feature) = state.feature_mut(feature_id) {
                        feature.vote_count = feature.vote_count.saturating_sub(1);
                    }
                }
                rank_features(&mut state.features);
                let remaining = self.allowance.refund(&spend);
                tracing::warn!("Vote for {} rolled back: {}", feature_id, error);
                VoteOutcome::RolledBack {
                    feature_id: feature_id.to_string(),
                    remaining,
                    notice: rollback_notice(&error),
                    error,
                }
            }
        }
    }

    /// Send a feature idea with an optional contact address.
    ///
    /// Blank input is rejected locally. Remote failures are returned, not retried.
    pub async fn submit_suggestion(
        &self,
        text: &str,
        contact_email: Option<&str>,
    ) -> Result<(), SubmitError> {
        let input = CreateSubmissionInput {
            kind: SubmissionKind::Idea,
            content: text.to_string(),
            contact_email: contact_email.map(str::to_string),
        }
        .normalized()
        .map_err(SubmitError::Empty)?;

        self.repository
            .submit_suggestion(&input.content, input.contact_email.as_deref())
            .await
            .map_err(|e| {
                tracing::warn!("Suggestion not delivered: {}", e);
                SubmitError::Remote(e)
            })
    }
}

fn rollback_notice(error: &RepositoryError) -> String {
    match error {
        RepositoryError::NotFound(_) => {
            "That feature is no longer on the board. Your vote was refunded.".to_string()
        }
        RepositoryError::RemoteUnavailable(_) => {
            "Vote failed, please try again later. Your vote was refunded.".to_string()
        }
    }
}
