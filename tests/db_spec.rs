use oryn_vote::board::{normalize_post, NormalizedPost};
use oryn_vote::db::Database;
use oryn_vote::models::*;
use speculate2::speculate;

fn create_test_feature(db: &Database, id: &str, votes: u32) -> Feature {
    db.create_feature(CreateFeatureInput {
        id: id.to_string(),
        title: format!("Feature {}", id),
        description: String::new(),
        category: FeatureCategory::Web,
        vote_count: Some(votes),
        is_live: false,
    })
    .expect("Failed to create feature")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "features" {
        describe "create_feature" {
            it "creates a feature starting at zero votes" {
                let feature = db.create_feature(CreateFeatureInput {
                    id: "feat_nap".to_string(),
                    title: "Power Nap Recharge".to_string(),
                    description: "Guided naps".to_string(),
                    category: FeatureCategory::Mobile,
                    vote_count: None,
                    is_live: false,
                }).expect("Failed to create feature");

                assert_eq!(feature.id, "feat_nap");
                assert_eq!(feature.vote_count, 0);
                assert_eq!(feature.category, FeatureCategory::Mobile);
            }

            it "rejects a duplicate id" {
                create_test_feature(&db, "dup", 0);
                let result = db.create_feature(CreateFeatureInput {
                    id: "dup".to_string(),
                    title: "Again".to_string(),
                    description: String::new(),
                    category: FeatureCategory::Script,
                    vote_count: None,
                    is_live: false,
                });

                let err = result.expect_err("duplicate id should fail");
                assert!(err.to_string().contains("already exists"));
            }

            it "lets exactly one of several concurrent creates win" {
                let results: Vec<_> = std::thread::scope(|scope| {
                    let handles: Vec<_> = (0..8)
                        .map(|_| {
                            let db = db.clone();
                            scope.spawn(move || {
                                db.create_feature(CreateFeatureInput {
                                    id: "race".to_string(),
                                    title: "Race".to_string(),
                                    description: String::new(),
                                    category: FeatureCategory::Web,
                                    vote_count: None,
                                    is_live: false,
                                })
                            })
                        })
                        .collect();
                    handles.into_iter().map(|h| h.join().unwrap()).collect()
                });

                let created = results.iter().filter(|r| r.is_ok()).count();
                assert_eq!(created, 1);
                for err in results.iter().filter_map(|r| r.as_ref().err()) {
                    assert!(err.to_string().contains("already exists"));
                }
            }

            it "rejects an empty id" {
                let result = db.create_feature(CreateFeatureInput {
                    id: "  ".to_string(),
                    title: "Nameless".to_string(),
                    description: String::new(),
                    category: FeatureCategory::Web,
                    vote_count: None,
                    is_live: false,
                });
                assert!(result.is_err());
            }
        }

        describe "get_all_features" {
            it "returns empty list when no features exist" {
                let features = db.get_all_features().expect("Query failed");
                assert!(features.is_empty());
            }

            it "orders by votes descending with ties in creation order" {
                create_test_feature(&db, "a", 5);
                create_test_feature(&db, "b", 5);
                create_test_feature(&db, "c", 10);

                let ids: Vec<String> = db.get_all_features()
                    .expect("Query failed")
                    .into_iter()
                    .map(|f| f.id)
                    .collect();
                assert_eq!(ids, vec!["c", "a", "b"]);
            }
        }

        describe "get_feature" {
            it "returns None for unknown id" {
                assert!(db.get_feature("nope").expect("Query failed").is_none());
            }
        }

        describe "update_feature" {
            it "updates only the given fields" {
                create_test_feature(&db, "x", 2);

                let updated = db.update_feature("x", UpdateFeatureInput {
                    is_live: Some(true),
                    ..Default::default()
                })
                .expect("Update failed")
                .expect("Feature missing");

                assert!(updated.is_live);
                assert_eq!(updated.vote_count, 2);
                assert_eq!(updated.title, "Feature x");

                let stored = db.get_feature("x").unwrap().unwrap();
                assert!(stored.is_live);
            }

            it "returns None for unknown id" {
                let result = db.update_feature("ghost", UpdateFeatureInput::vote_count(1))
                    .expect("Update failed");
                assert!(result.is_none());
            }
        }

        describe "increment_vote" {
            it "adds one vote and returns the new tally" {
                create_test_feature(&db, "x", 0);

                assert_eq!(db.increment_vote("x").unwrap(), Some(1));
                assert_eq!(db.increment_vote("x").unwrap(), Some(2));
                assert_eq!(db.get_feature("x").unwrap().unwrap().vote_count, 2);
            }

            it "returns None for unknown id" {
                assert_eq!(db.increment_vote("ghost").unwrap(), None);
            }
        }

        describe "seed_default_features" {
            it "seeds an empty store once" {
                let seeded = db.seed_default_features().expect("Seed failed");
                assert_eq!(seeded, default_features().len());
                assert_eq!(db.seed_default_features().expect("Seed failed"), 0);

                let features = db.get_all_features().unwrap();
                assert_eq!(features.len(), seeded);
                assert!(features.iter().all(|f| f.vote_count == 0));
            }

            it "leaves a populated store alone" {
                create_test_feature(&db, "custom", 1);
                assert_eq!(db.seed_default_features().unwrap(), 0);
                assert_eq!(db.get_all_features().unwrap().len(), 1);
            }
        }
    }

    describe "submissions" {
        it "stores a trimmed idea with contact email" {
            let submission = db.create_submission(CreateSubmissionInput {
                kind: SubmissionKind::Idea,
                content: " Dorm wifi fixer ".to_string(),
                contact_email: Some("me@example.com".to_string()),
            }).expect("Failed to create submission");

            assert_eq!(submission.content, "Dorm wifi fixer");
            assert_eq!(submission.contact_email.as_deref(), Some("me@example.com"));
        }

        it "rejects a blank wish" {
            let result = db.create_submission(CreateSubmissionInput {
                kind: SubmissionKind::Wish,
                content: "   ".to_string(),
                contact_email: None,
            });
            assert!(result.is_err());
        }

        it "lists newest first" {
            for content in ["first", "second"] {
                db.create_submission(CreateSubmissionInput {
                    kind: SubmissionKind::Wish,
                    content: content.to_string(),
                    contact_email: None,
                }).unwrap();
            }

            let submissions = db.get_all_submissions().unwrap();
            assert_eq!(submissions.len(), 2);
            assert_eq!(submissions[0].content, "second");
            assert_eq!(submissions[0].kind, SubmissionKind::Wish);
        }
    }

    describe "messages" {
        it "stores normalized posts newest first" {
            let dev = normalize_post(&PostMessageInput {
                name: "#dev".to_string(),
                content: "v1.1 is out".to_string(),
            }).unwrap();
            db.create_message(dev).unwrap();
            db.create_message(NormalizedPost {
                name: "Mei".to_string(),
                content: "love it".to_string(),
                is_dev: false,
            }).unwrap();

            let messages = db.get_all_messages().unwrap();
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].name, "Mei");
            assert!(!messages[0].is_dev);
            assert_eq!(messages[1].name, "oryn.tw");
            assert!(messages[1].is_dev);
        }
    }
}
