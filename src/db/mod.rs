mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::board::NormalizedPost;
use crate::models::*;
use crate::repository::{FeatureRepository, RepositoryError};

const FEATURE_COLUMNS: &str =
    "id, title, description, category, vote_count, is_live, created_at, updated_at";

/// SQLite-backed record store for features, submissions and board posts.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Feature operations
    // ============================================================

    /// All features, most votes first, ties in insertion order.
    pub fn get_all_features(&self) -> Result<Vec<Feature>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEATURE_COLUMNS} FROM features ORDER BY vote_count DESC, seq"
        ))?;

        let features = stmt
            .query_map([], feature_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(features)
    }

    pub fn get_feature(&self, id: &str) -> Result<Option<Feature>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let feature = conn
            .query_row(
                &format!("SELECT {FEATURE_COLUMNS} FROM features WHERE id = ?"),
                [id],
                feature_from_row,
            )
            .optional()?;
        Ok(feature)
    }

    pub fn create_feature(&self, input: CreateFeatureInput) -> Result<Feature> {
        let id = input.id.trim().to_string();
        if id.is_empty() {
            anyhow::bail!("Feature id must not be empty");
        }

        // Existence check and insert share one guard.
        let conn = self.conn.lock().expect("database lock poisoned");
        let exists = conn
            .query_row("SELECT 1 FROM features WHERE id = ?", [&id], |_| Ok(()))
            .optional()?
            .is_some();
        if exists {
            anyhow::bail!("Feature already exists: {}", id);
        }

        let now = Utc::now();
        let vote_count = input.vote_count.unwrap_or(0);

        conn.execute(
            "INSERT INTO features (id, title, description, category, vote_count, is_live, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                &input.title,
                &input.description,
                input.category.as_str(),
                vote_count,
                input.is_live as i32,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Feature {
            id,
            title: input.title,
            description: input.description,
            category: input.category,
            vote_count,
            is_live: input.is_live,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_feature(&self, id: &str, input: UpdateFeatureInput) -> Result<Option<Feature>> {
        let Some(existing) = self.get_feature(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let updated = Feature {
            id: existing.id,
            title: input.title.unwrap_or(existing.title),
            description: input.description.unwrap_or(existing.description),
            category: input.category.unwrap_or(existing.category),
            vote_count: input.vote_count.unwrap_or(existing.vote_count),
            is_live: input.is_live.unwrap_or(existing.is_live),
            created_at: existing.created_at,
            updated_at: now,
        };

        conn.execute(
            "UPDATE features SET title = ?, description = ?, category = ?, vote_count = ?, is_live = ?, updated_at = ?
             WHERE id = ?",
            (
                &updated.title,
                &updated.description,
                updated.category.as_str(),
                updated.vote_count,
                updated.is_live as i32,
                now.to_rfc3339(),
                &updated.id,
            ),
        )?;

        Ok(Some(updated))
    }

    /// Add one vote in a single statement. Returns `None` for an unknown id.
    pub fn increment_vote(&self, id: &str) -> Result<Option<u32>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count = conn
            .query_row(
                "UPDATE features SET vote_count = vote_count + 1, updated_at = ?
                 WHERE id = ? RETURNING vote_count",
                (Utc::now().to_rfc3339(), id),
                |row| row.get::<_, u32>(0),
            )
            .optional()?;
        Ok(count)
    }

    /// Insert the launch catalog when the store has no features yet.
    ///
    /// Returns how many features were inserted.
    pub fn seed_default_features(&self) -> Result<usize> {
        if !self.get_all_features()?.is_empty() {
            return Ok(0);
        }
        let catalog = default_features();
        let count = catalog.len();
        for input in catalog {
            self.create_feature(input)?;
        }
        tracing::info!("Seeded {} features", count);
        Ok(count)
    }

    // ============================================================
    // Submission operations
    // ============================================================

    pub fn create_submission(&self, input: CreateSubmissionInput) -> Result<Submission> {
        let input = input
            .normalized()
            .map_err(|msg| anyhow::anyhow!("Invalid submission: {}", msg))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO submissions (id, kind, content, contact_email, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.kind.as_str(),
                &input.content,
                &input.contact_email,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Submission {
            id,
            kind: input.kind,
            content: input.content,
            contact_email: input.contact_email,
            created_at: now,
        })
    }

    /// All submissions, newest first.
    pub fn get_all_submissions(&self) -> Result<Vec<Submission>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, kind, content, contact_email, created_at
             FROM submissions ORDER BY created_at DESC, rowid DESC",
        )?;

        let submissions = stmt
            .query_map([], |row| {
                Ok(Submission {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    kind: SubmissionKind::from_str(&row.get::<_, String>(1)?)
                        .unwrap_or(SubmissionKind::Wish),
                    content: row.get(2)?,
                    contact_email: row.get(3)?,
                    created_at: parse_datetime(row.get::<_, String>(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(submissions)
    }

    // ============================================================
    // Message board operations
    // ============================================================

    pub fn create_message(&self, post: NormalizedPost) -> Result<Message> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO messages (id, name, content, is_dev, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &post.name,
                &post.content,
                post.is_dev as i32,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Message {
            id,
            name: post.name,
            content: post.content,
            is_dev: post.is_dev,
            created_at: now,
        })
    }

    /// Board posts with non-blank content, newest first.
    pub fn get_all_messages(&self) -> Result<Vec<Message>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, content, is_dev, created_at
             FROM messages WHERE trim(content) != '' ORDER BY created_at DESC, rowid DESC",
        )?;

        let messages = stmt
            .query_map([], |row| {
                Ok(Message {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    content: row.get(2)?,
                    is_dev: row.get::<_, i32>(3)? != 0,
                    created_at: parse_datetime(row.get::<_, String>(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }
}

/// In-process repository. Increments are atomic here, unlike over HTTP.
#[async_trait]
impl FeatureRepository for Database {
    async fn list(&self) -> Result<Vec<Feature>, RepositoryError> {
        self.get_all_features()
            .map_err(|e| RepositoryError::RemoteUnavailable(e.to_string()))
    }

    async fn increment_vote(&self, feature_id: &str) -> Result<u32, RepositoryError> {
        Database::increment_vote(self, feature_id)
            .map_err(|e| RepositoryError::RemoteUnavailable(e.to_string()))?
            .ok_or_else(|| RepositoryError::NotFound(feature_id.to_string()))
    }

    async fn submit(&self, input: CreateSubmissionInput) -> Result<(), RepositoryError> {
        self.create_submission(input)
            .map(|_| ())
            .map_err(|e| RepositoryError::RemoteUnavailable(e.to_string()))
    }
}

fn feature_from_row(row: &Row<'_>) -> rusqlite::Result<Feature> {
    Ok(Feature {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: FeatureCategory::from_str(&row.get::<_, String>(3)?)
            .unwrap_or(FeatureCategory::Web),
        vote_count: row.get(4)?,
        is_live: row.get::<_, i32>(5)? != 0,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
