//! Domain models for the voting board.
//!
//! # Core Concepts
//!
//! ## Remote records
//!
//! - [`Feature`]: A wishlist item with a vote tally, seeded in the remote store.
//! - [`Submission`]: An idea, wish or signup appended by a visitor.
//! - [`Message`]: A post on the community message board.
//!
//! ## Local records
//!
//! These live in the visitor's local key-value storage and never leave it:
//!
//! - [`Allowance`]: Remaining votes for the current calendar day.
//! - [`ShareGrant`]: Whether the one-time share reward has been claimed.

mod allowance;
mod catalog;
mod feature;
mod message;
mod submission;

pub use allowance::*;
pub use catalog::*;
pub use feature::*;
pub use message::*;
pub use submission::*;
