//! Cache synchronization.
//!
//! `SyncEngine::synchronize` refreshes the country catalog, works out which
//! countries are stale, and fetches them one at a time. A failed country is
//! reported, followed by a fixed pause (the public API rate-limits callers),
//! and left stale so the next run retries it.
//!
//! Progress is published as `SyncEvent`s on an optional channel.

pub mod clock;
pub mod engine;

use std::time::Duration;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{is_stale, SyncEngine};

/// Pause after a failed fetch, in seconds.
pub const DEFAULT_BACKOFF_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// How long to wait after a failed country before moving on.
    pub backoff: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(DEFAULT_BACKOFF_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// `processed` of `total` countries visited so far.
    Progress { processed: usize, total: usize },
    EntityFailed { slug: String, error: String },
    Complete(SyncReport),
}

/// Outcome of one `synchronize` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub total: usize,
    /// Slugs fetched and cached by this run.
    pub fetched: Vec<String>,
    /// Countries that were already current.
    pub up_to_date: usize,
    /// `(slug, error message)` for every country that failed.
    pub failed: Vec<(String, String)>,
    /// Set when the run stopped early on cancellation.
    pub cancelled: bool,
}

impl SyncReport {
    pub fn processed(&self) -> usize {
        self.fetched.len() + self.up_to_date + self.failed.len()
    }
}
