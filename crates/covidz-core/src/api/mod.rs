//! Remote data source module.
//!
//! The `Fetcher` trait is the seam between the sync engine and the remote
//! source; `ApiClient` implements it over HTTP for the public COVID-19 API.
//! Neither layer retries: retry policy belongs to the sync engine.

pub mod client;
pub mod error;

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::ApiError;

use crate::models::{Entity, RawSeriesRow};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// List every country the source knows about, in source order.
    async fn list_entities(&self) -> Result<Vec<Entity>, ApiError>;

    /// Fetch the full daily series of one country, from its first case on.
    async fn fetch_series(&self, slug: &str) -> Result<Vec<RawSeriesRow>, ApiError>;
}
