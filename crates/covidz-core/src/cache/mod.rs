//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for the per-country series files
//! and the country catalog, and the `StatusStore` recording when each country
//! was last synced. Everything lives under one data directory:
//!
//! - `countries.csv` - the catalog, `Slug;Country`
//! - `{slug}.csv` - one daily series per country
//! - `status.json` - slug to `YY-MM-DD` of last successful sync

pub mod error;
pub mod manager;
pub mod status;

use std::path::Path;

pub use error::CacheError;
pub use manager::CacheManager;
pub use status::{StatusStore, SyncStatus};

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    std::fs::write(&tmp, contents).map_err(|e| CacheError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| CacheError::io(path, e))?;
    Ok(())
}
