//! Read path: resolve what the user asked for, then load it from the cache.

use tracing::{debug, warn};

use crate::api::Fetcher;
use crate::cache::CacheManager;
use crate::error::Result;
use crate::models::{Catalog, Entity, RawSeriesRow, KNOWN_VARIABLES};

/// Requested variables and countries after matching them against what is
/// known. Names that matched nothing are kept in `dropped`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub variables: Vec<String>,
    pub entities: Vec<Entity>,
    pub dropped: Vec<String>,
}

impl Selection {
    /// Lowercase country names, as matched against series rows.
    pub fn entity_keys(&self) -> Vec<String> {
        self.entities.iter().map(Entity::key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() || self.entities.is_empty()
    }
}

/// Match requested names case-insensitively. Countries may be given by name
/// or slug. Duplicates collapse to their first occurrence.
pub fn resolve(variables: &[String], entities: &[String], catalog: &Catalog) -> Selection {
    let mut selection = Selection::default();

    for name in variables {
        let lowered = name.to_lowercase();
        if KNOWN_VARIABLES.contains(&lowered.as_str()) {
            if !selection.variables.contains(&lowered) {
                selection.variables.push(lowered);
            }
        } else {
            selection.dropped.push(name.clone());
        }
    }

    for name in entities {
        match catalog.find(name) {
            Some(entity) => {
                if !selection.entities.iter().any(|e| e.slug == entity.slug) {
                    selection.entities.push(entity.clone());
                }
            }
            None => selection.dropped.push(name.clone()),
        }
    }

    if !selection.dropped.is_empty() {
        debug!(dropped = ?selection.dropped, "Unknown names dropped from request");
    }
    selection
}

/// Read the cached series of every selected country.
pub fn load_rows(cache: &CacheManager, selection: &Selection) -> Result<Vec<RawSeriesRow>> {
    let mut rows = Vec::new();
    for entity in &selection.entities {
        rows.extend(cache.read_series(&entity.slug)?);
    }
    Ok(rows)
}

impl Catalog {
    /// Read the cached catalog, or fetch it live when nothing is cached yet.
    pub async fn load_or_fetch<F: Fetcher + ?Sized>(cache: &CacheManager, fetcher: &F) -> Result<Self> {
        match cache.read_catalog() {
            Ok(entities) => Ok(Catalog::new(entities)),
            Err(e) if e.is_not_found() => {
                warn!("No cached catalog, fetching countries from source");
                Ok(Catalog::new(fetcher.list_entities().await?))
            }
            Err(e) => Err(e.into()),
        }
    }
}
