//! End-to-end voting against a live record store over HTTP.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use oryn_vote::allowance::AllowanceStore;
use oryn_vote::api::create_router;
use oryn_vote::client::FeatureClient;
use oryn_vote::clock::FixedClock;
use oryn_vote::db::Database;
use oryn_vote::engine::{VoteOutcome, VotingEngine};
use oryn_vote::models::*;
use oryn_vote::repository::RepositoryError;
use oryn_vote::share::{ShareAction, ShareOutcome, SharePlatform, ShareRewardPolicy, ShareTarget};
use oryn_vote::storage::MemoryStore;

struct Visitor {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    allowance: AllowanceStore,
}

fn visitor() -> Visitor {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
    ));
    let allowance = AllowanceStore::new(store.clone(), clock.clone());
    Visitor {
        store,
        clock,
        allowance,
    }
}

fn seeded_db() -> Database {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db.seed_default_features().expect("Failed to seed");
    db
}

/// Serve the record store on an ephemeral port and return its API base URL.
async fn spawn_store(db: Database) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(db)).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

/// A base URL nothing is listening on.
async fn dead_store() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v1", addr)
}

fn engine_for(url: &str, visitor: &Visitor) -> VotingEngine {
    VotingEngine::new(
        Arc::new(FeatureClient::new(url, None)),
        visitor.allowance.clone(),
    )
}

#[derive(Default)]
struct RecordingTarget {
    actions: Mutex<Vec<ShareAction>>,
}

impl ShareTarget for RecordingTarget {
    fn perform(&self, action: &ShareAction) {
        self.actions.lock().unwrap().push(action.clone());
    }
}

mod voting {
    use super::*;

    #[tokio::test]
    async fn vote_is_committed_remotely() {
        let db = seeded_db();
        let url = spawn_store(db.clone()).await;
        let visitor = visitor();
        let engine = engine_for(&url, &visitor);

        engine.refresh().await.expect("refresh failed");
        assert_eq!(engine.remaining(), 3);

        let outcome = engine.vote("feat_nap").await;

        assert_eq!(
            outcome,
            VoteOutcome::Committed {
                feature_id: "feat_nap".to_string(),
                vote_count: 1,
                remaining: 2,
            }
        );
        assert_eq!(db.get_feature("feat_nap").unwrap().unwrap().vote_count, 1);
        assert_eq!(engine.features()[0].id, "feat_nap");
    }

    #[tokio::test]
    async fn fourth_vote_of_the_day_is_refused() {
        let db = seeded_db();
        let url = spawn_store(db.clone()).await;
        let visitor = visitor();
        let engine = engine_for(&url, &visitor);
        engine.refresh().await.unwrap();

        for _ in 0..3 {
            assert!(engine.vote("feat_ghost").await.is_committed());
        }

        assert_eq!(engine.vote("feat_ghost").await, VoteOutcome::Exhausted);
        assert_eq!(engine.remaining(), 0);
        assert_eq!(db.get_feature("feat_ghost").unwrap().unwrap().vote_count, 3);
    }

    #[tokio::test]
    async fn allowance_resets_the_next_day() {
        let url = spawn_store(seeded_db()).await;
        let visitor = visitor();
        let engine = engine_for(&url, &visitor);

        for _ in 0..3 {
            engine.vote("feat_slide").await;
        }
        assert_eq!(engine.remaining(), 0);

        visitor.clock.advance_days(1);

        assert_eq!(engine.remaining(), 3);
        assert!(engine.vote("feat_slide").await.is_committed());
    }

    #[tokio::test]
    async fn unreachable_store_rolls_back() {
        let visitor = visitor();
        let engine = engine_for(&dead_store().await, &visitor);

        match engine.vote("feat_nap").await {
            VoteOutcome::RolledBack {
                remaining, error, ..
            } => {
                assert_eq!(remaining, 3);
                assert!(matches!(error, RepositoryError::RemoteUnavailable(_)));
            }
            other => panic!("expected rollback, got {:?}", other),
        }
        assert_eq!(engine.remaining(), 3);
    }

    #[tokio::test]
    async fn failure_after_a_vote_keeps_the_earlier_spend() {
        let db = seeded_db();
        let url = spawn_store(db).await;
        let visitor = visitor();

        let engine = engine_for(&url, &visitor);
        assert!(engine.vote("feat_mirror").await.is_committed());
        assert_eq!(engine.remaining(), 2);

        let offline = engine_for(&dead_store().await, &visitor);
        let outcome = offline.vote("feat_mirror").await;

        assert!(matches!(outcome, VoteOutcome::RolledBack { remaining: 2, .. }));
        assert_eq!(visitor.allowance.get_remaining(), 2);
    }

    #[tokio::test]
    async fn unknown_feature_is_refunded() {
        let url = spawn_store(seeded_db()).await;
        let visitor = visitor();
        let engine = engine_for(&url, &visitor);

        match engine.vote("feat_removed").await {
            VoteOutcome::RolledBack { error, remaining, .. } => {
                assert!(matches!(error, RepositoryError::NotFound(_)));
                assert_eq!(remaining, 3);
            }
            other => panic!("expected rollback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn saturated_tally_rolls_back_instead_of_overflowing() {
        let db = seeded_db();
        db.update_feature("feat_nap", UpdateFeatureInput::vote_count(u32::MAX))
            .unwrap();
        let url = spawn_store(db.clone()).await;
        let visitor = visitor();
        let engine = engine_for(&url, &visitor);
        engine.refresh().await.unwrap();

        match engine.vote("feat_nap").await {
            VoteOutcome::RolledBack { error, remaining, .. } => {
                assert!(matches!(error, RepositoryError::RemoteUnavailable(_)));
                assert_eq!(remaining, 3);
            }
            other => panic!("expected rollback, got {:?}", other),
        }
        assert_eq!(
            db.get_feature("feat_nap").unwrap().unwrap().vote_count,
            u32::MAX
        );
    }

    #[tokio::test]
    async fn refresh_reports_an_unreachable_store() {
        let visitor = visitor();
        let engine = engine_for(&dead_store().await, &visitor);

        let err = engine.refresh().await.expect_err("refresh should fail");

        assert!(matches!(err, RepositoryError::RemoteUnavailable(_)));
        assert!(engine.features().is_empty());
        assert_eq!(engine.remaining(), 3);
    }

    #[tokio::test]
    async fn suggestion_reaches_the_store() {
        let db = seeded_db();
        let url = spawn_store(db.clone()).await;
        let visitor = visitor();
        let engine = engine_for(&url, &visitor);

        engine
            .submit_suggestion("Dorm laundry tracker", Some("me@example.com"))
            .await
            .expect("suggestion failed");

        let submissions = db.get_all_submissions().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].kind, SubmissionKind::Idea);
        assert_eq!(submissions[0].content, "Dorm laundry tracker");
    }
}

mod sharing {
    use super::*;

    fn policy(visitor: &Visitor, target: Arc<RecordingTarget>) -> ShareRewardPolicy {
        ShareRewardPolicy::new(
            visitor.allowance.clone(),
            visitor.store.clone(),
            target,
            "https://oryn.tw",
        )
    }

    #[tokio::test]
    async fn share_bonus_is_capped_and_granted_once() {
        let url = spawn_store(seeded_db()).await;
        let visitor = visitor();
        let engine = engine_for(&url, &visitor);
        let target = Arc::new(RecordingTarget::default());
        let policy = policy(&visitor, target.clone());

        assert!(engine.vote("feat_formatter").await.is_committed());
        assert_eq!(engine.remaining(), 2);

        assert!(matches!(
            policy.claim(SharePlatform::Copy),
            ShareOutcome::Granted { remaining: 5, .. }
        ));
        assert_eq!(
            policy.claim(SharePlatform::Line),
            ShareOutcome::AlreadyClaimed { remaining: 5 }
        );
        assert_eq!(
            *target.actions.lock().unwrap(),
            vec![ShareAction::CopyText("https://oryn.tw".to_string())]
        );

        for _ in 0..5 {
            assert!(engine.vote("feat_synapse").await.is_committed());
        }
        assert_eq!(engine.vote("feat_synapse").await, VoteOutcome::Exhausted);
    }

    #[tokio::test]
    async fn bonus_on_a_full_allowance_stops_at_the_cap() {
        let visitor = visitor();
        let policy = policy(&visitor, Arc::new(RecordingTarget::default()));

        visitor.allowance.set_remaining(5);

        assert!(matches!(
            policy.claim(SharePlatform::Line),
            ShareOutcome::Granted { remaining: 6, .. }
        ));
    }
}
