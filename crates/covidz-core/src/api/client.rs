//! HTTP client for the COVID-19 API.
//!
//! This module provides the `ApiClient` struct, the production `Fetcher`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::{ApiError, Fetcher};
use crate::models::{Entity, RawSeriesRow};

// ============================================================================
// Constants
// ============================================================================

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.covid19api.com";

/// HTTP request timeout in seconds.
/// Full country series can be several megabytes, so this is generous.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the COVID-19 API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|source| ApiError::SourceUnavailable {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn countries_url(&self) -> String {
        format!("{}/countries", self.base_url)
    }

    fn series_url(&self, slug: &str) -> String {
        format!("{}/dayone/country/{}", self.base_url, slug)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url = url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::SourceUnavailable {
                url: url.to_string(),
                source,
            })?;

        let response = Self::check_response(response).await?;

        // Body read failures are transport problems, decode failures are not.
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::SourceUnavailable {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for ApiClient {
    async fn list_entities(&self) -> Result<Vec<Entity>, ApiError> {
        let url = self.countries_url();
        let entities: Vec<Entity> = self.get(&url).await?;
        debug!(count = entities.len(), "Countries fetched");
        Ok(entities)
    }

    async fn fetch_series(&self, slug: &str) -> Result<Vec<RawSeriesRow>, ApiError> {
        let url = self.series_url(slug);
        let objects: Vec<Map<String, Value>> = self.get(&url).await?;

        let rows = objects
            .iter()
            .map(RawSeriesRow::from_api_object)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|detail| ApiError::InvalidResponse {
                url: url.clone(),
                detail,
            })?;

        debug!(slug = slug, rows = rows.len(), "Series fetched");
        Ok(rows)
    }
}
