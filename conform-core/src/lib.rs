//! Core library for submittal conformance review.
//!
//! Holds the domain model, the in-memory review state for one conformance run,
//! and the persistence layer. The terminal front-end in the `conform` crate is
//! a thin shell over [`workspace::ReviewWorkspace`] and the repository traits.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod citation;
pub mod comments;
pub mod db;
pub mod error;
pub mod export;
pub mod filter;
pub mod mentions;
pub mod notify;
pub mod processing;
pub mod repository;
pub mod reviewers;
pub mod schema;
pub mod seed;
pub mod session;
pub mod status;
pub mod store;
pub mod types;
pub mod workspace;

pub use error::{Result, ReviewError};

/// Fresh UUID v4 text for records created at runtime.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Returns the current Unix timestamp in seconds.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
