//! Core library for covidz.
//!
//! Fetches daily per-country COVID-19 series from the public API, keeps them
//! cached on disk, and turns cached rows into smoothed long-format series.
//!
//! - [`api`]: the `Fetcher` seam and its HTTP implementation
//! - [`cache`]: series/catalog files and the sync status file
//! - [`sync`]: the `SyncEngine` deciding what to refresh
//! - [`transform`]: the smoothing pipeline
//! - [`query`]: resolving user requests and loading cached rows

pub mod api;
pub mod cache;
pub mod error;
pub mod models;
pub mod query;
pub mod sync;
pub mod transform;

pub use api::{ApiClient, ApiError, Fetcher};
pub use cache::{CacheError, CacheManager, StatusStore, SyncStatus};
pub use error::{Error, Result};
pub use models::{Catalog, Entity, RawSeriesRow, TidyRow, KNOWN_VARIABLES};
pub use query::Selection;
pub use sync::{SyncEngine, SyncEvent, SyncOptions, SyncReport};
pub use transform::transform;

pub use tokio_util::sync::CancellationToken;
