use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::{write_atomic, CacheError};

/// Status file name in the data directory
const STATUS_FILE: &str = "status.json";

/// On-disk date format. Two-digit years parse back into the 2000s for
/// every year the source can report.
const STATUS_DATE_FORMAT: &str = "%y-%m-%d";

/// Last successful sync date per country slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    entries: BTreeMap<String, NaiveDate>,
}

impl SyncStatus {
    pub fn get(&self, slug: &str) -> Option<NaiveDate> {
        self.entries.get(slug).copied()
    }

    /// Record a sync date. A date earlier than the one already recorded is
    /// ignored, so the stored date never moves backwards.
    pub fn set(&mut self, slug: &str, date: NaiveDate) {
        let entry = self.entries.entry(slug.to_string()).or_insert(date);
        if date > *entry {
            *entry = date;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Reads and writes `status.json`.
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STATUS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the status map. A missing file is an empty map; a file that
    /// cannot be parsed is an error, never silently discarded.
    pub fn load(&self) -> Result<SyncStatus, CacheError> {
        if !self.path.exists() {
            return Ok(SyncStatus::default());
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| CacheError::io(&self.path, e))?;
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&contents).map_err(|e| CacheError::malformed(&self.path, e))?;

        let mut entries = BTreeMap::new();
        for (slug, value) in raw {
            let date = NaiveDate::parse_from_str(&value, STATUS_DATE_FORMAT).map_err(|e| {
                CacheError::malformed(&self.path, format!("{}: bad date '{}': {}", slug, value, e))
            })?;
            entries.insert(slug, date);
        }

        Ok(SyncStatus { entries })
    }

    pub fn save(&self, status: &SyncStatus) -> Result<(), CacheError> {
        let raw: BTreeMap<&str, String> = status
            .iter()
            .map(|(slug, date)| (slug, date.format(STATUS_DATE_FORMAT).to_string()))
            .collect();
        let contents =
            serde_json::to_string_pretty(&raw).map_err(|e| CacheError::malformed(&self.path, e))?;
        write_atomic(&self.path, contents.as_bytes())
    }
}
