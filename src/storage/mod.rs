//! Local persistent key-value storage.
//!
//! The voting core keeps its per-visitor state (allowance, share grant) in a
//! small string-keyed store. It is passed in explicitly so tests can swap the
//! on-disk store for [`MemoryStore`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors raised by local storage.
#[derive(Debug, Error)]
pub enum LocalStateError {
    #[error("Malformed local state under {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("Local state I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local state could not be encoded: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Synchronous string key-value storage scoped to one visitor profile.
///
/// Writes must be visible to the next `get` on the same store even if
/// persisting them fails.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), LocalStateError>;
}
