//! Feature wishlist voting with a daily allowance and optimistic remote sync.
//!
//! Visitors get a small daily budget of votes, kept in local storage. Votes
//! show up immediately and are rolled back if the remote store rejects them.
//! A one-time share reward tops the budget up.

pub mod allowance;
pub mod api;
pub mod board;
pub mod client;
pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod repository;
pub mod share;
pub mod storage;
