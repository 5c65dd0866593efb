use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{Clock, SyncEvent, SyncOptions, SyncReport, SystemClock};
use crate::api::Fetcher;
use crate::cache::{CacheManager, StatusStore, SyncStatus};
use crate::error::Result;
use crate::models::Entity;

/// A country needs fetching when it was never synced, when its series file
/// is gone, or when its last sync happened before `today`.
pub fn is_stale(entity: &Entity, status: &SyncStatus, cache: &CacheManager, today: NaiveDate) -> bool {
    match status.get(&entity.slug) {
        None => true,
        Some(last) => !cache.has_series(&entity.slug) || last < today,
    }
}

/// Keeps the local cache current with the remote source.
///
/// The engine is the only writer of the series files and the status file.
/// It never runs fetches concurrently.
pub struct SyncEngine<F, C = SystemClock> {
    fetcher: F,
    cache: CacheManager,
    status: StatusStore,
    clock: C,
    options: SyncOptions,
    events: Option<mpsc::Sender<SyncEvent>>,
}

impl<F: Fetcher> SyncEngine<F, SystemClock> {
    pub fn new(fetcher: F, cache: CacheManager, options: SyncOptions) -> Self {
        let status = StatusStore::new(cache.cache_dir());
        Self {
            fetcher,
            cache,
            status,
            clock: SystemClock,
            options,
            events: None,
        }
    }
}

impl<F: Fetcher, C: Clock> SyncEngine<F, C> {
    /// Replace the clock used to decide what "today" is.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SyncEngine<F, C2> {
        SyncEngine {
            fetcher: self.fetcher,
            cache: self.cache,
            status: self.status,
            clock,
            options: self.options,
            events: self.events,
        }
    }

    /// Publish progress on `tx`. A dropped receiver does not stop the sync.
    pub fn with_events(mut self, tx: mpsc::Sender<SyncEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn status_store(&self) -> &StatusStore {
        &self.status
    }

    async fn send_event(&self, event: SyncEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.send(event).await {
                debug!(error = %e, "Sync event dropped - receiver closed");
            }
        }
    }

    /// Run one synchronization pass.
    ///
    /// Fails only if the catalog cannot be refreshed or the cached catalog and
    /// status cannot be read back. Per-country failures are contained in the
    /// returned report.
    pub async fn synchronize(&self, cancel: &CancellationToken) -> Result<SyncReport> {
        info!("Sync started");

        let live = self.fetcher.list_entities().await?;
        self.cache.write_catalog(&live)?;

        let catalog = self.cache.read_catalog()?;
        let mut status = self.status.load()?;
        let today = self.clock.today();

        let mut report = SyncReport {
            total: catalog.len(),
            ..Default::default()
        };

        for entity in &catalog {
            if !is_stale(entity, &status, &self.cache, today) {
                report.up_to_date += 1;
            } else {
                if cancel.is_cancelled() {
                    info!(
                        processed = report.processed(),
                        total = report.total,
                        "Sync cancelled"
                    );
                    report.cancelled = true;
                    break;
                }

                match self.refresh_entity(entity, &mut status, today).await {
                    Ok(()) => report.fetched.push(entity.slug.clone()),
                    Err(e) => {
                        warn!(slug = %entity.slug, error = %e, "Failed to sync country");
                        self.send_event(SyncEvent::EntityFailed {
                            slug: entity.slug.clone(),
                            error: e.to_string(),
                        })
                        .await;
                        report.failed.push((entity.slug.clone(), e.to_string()));
                        self.backoff(cancel).await;
                    }
                }
            }

            self.send_event(SyncEvent::Progress {
                processed: report.processed(),
                total: report.total,
            })
            .await;
        }

        if report.failed.is_empty() {
            info!(
                fetched = report.fetched.len(),
                up_to_date = report.up_to_date,
                "Sync complete"
            );
        } else {
            error!(
                fetched = report.fetched.len(),
                failed = report.failed.len(),
                "Sync complete with failures"
            );
        }

        self.send_event(SyncEvent::Complete(report.clone())).await;
        Ok(report)
    }

    /// Fetch, cache, and record one country. The in-memory status only moves
    /// once the status file has been written.
    async fn refresh_entity(&self, entity: &Entity, status: &mut SyncStatus, today: NaiveDate) -> Result<()> {
        let rows = self.fetcher.fetch_series(&entity.slug).await?;
        self.cache.write_series(&entity.slug, &rows)?;

        let mut updated = status.clone();
        updated.set(&entity.slug, today);
        self.status.save(&updated)?;
        *status = updated;

        debug!(slug = %entity.slug, rows = rows.len(), "Country synced");
        Ok(())
    }

    async fn backoff(&self, cancel: &CancellationToken) {
        if self.options.backoff.is_zero() {
            return;
        }
        debug!(backoff_ms = self.options.backoff.as_millis() as u64, "Backing off");
        tokio::select! {
            _ = tokio::time::sleep(self.options.backoff) => {}
            _ = cancel.cancelled() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, d).unwrap()
    }

    #[test]
    fn test_never_synced_is_stale() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let entity = Entity::new("italy", "Italy");
        assert!(is_stale(&entity, &SyncStatus::default(), &cache, date(10)));
    }

    #[test]
    fn test_missing_file_is_stale_even_if_synced_today() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let entity = Entity::new("italy", "Italy");
        let mut status = SyncStatus::default();
        status.set("italy", date(10));
        assert!(is_stale(&entity, &status, &cache, date(10)));
    }

    #[test]
    fn test_synced_today_with_file_is_fresh() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        cache.write_series("italy", &[]).unwrap();
        let entity = Entity::new("italy", "Italy");
        let mut status = SyncStatus::default();
        status.set("italy", date(10));

        assert!(!is_stale(&entity, &status, &cache, date(10)));
        assert!(is_stale(&entity, &status, &cache, date(11)));
    }
}
