//! Message board posting rules.

use crate::models::{Message, PostMessageInput};

/// Name marker that flags a post as a developer log entry.
pub const DEV_MARKER: &str = "#dev";

/// Display name for developer posts that only carried the marker.
pub const DEV_DEFAULT_NAME: &str = "oryn.tw";

/// Display name for posts without a name.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// A post after the board rules were applied, ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPost {
    pub name: String,
    pub content: String,
    pub is_dev: bool,
}

/// Apply the board rules to raw form input.
///
/// Returns `None` when the content is blank.
pub fn normalize_post(input: &PostMessageInput) -> Option<NormalizedPost> {
    let content = input.content.trim();
    if content.is_empty() {
        return None;
    }

    let raw_name = input.name.trim();
    let (name, is_dev) = if raw_name.contains(DEV_MARKER) {
        let stripped = raw_name.replacen(DEV_MARKER, "", 1).trim().to_string();
        if stripped.is_empty() {
            (DEV_DEFAULT_NAME.to_string(), true)
        } else {
            (stripped, true)
        }
    } else if raw_name.is_empty() {
        (ANONYMOUS_NAME.to_string(), false)
    } else {
        (raw_name.to_string(), false)
    };

    Some(NormalizedPost {
        name,
        content: content.to_string(),
        is_dev,
    })
}

/// Split posts into the developer log and community columns, keeping order.
pub fn partition(messages: Vec<Message>) -> (Vec<Message>, Vec<Message>) {
    messages.into_iter().partition(|m| m.is_dev)
}
