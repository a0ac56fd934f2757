use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post on the community message board.
///
/// Posts with `is_dev` set are shown in the developer log column; all other
/// posts are community messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub is_dev: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw input from the board form. `name` may carry the developer marker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostMessageInput {
    #[serde(default)]
    pub name: String,
    pub content: String,
}
