use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use super::{write_atomic, CacheError};
use crate::models::{Entity, RawSeriesRow};

/// Catalog file name in the data directory
const CATALOG_FILE: &str = "countries.csv";

/// Field delimiter of every cached table.
const DELIMITER: u8 = b';';

/// Date format of the `date` column in series files.
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&cache_dir).map_err(|e| CacheError::io(&cache_dir, e))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn catalog_path(&self) -> PathBuf {
        self.cache_dir.join(CATALOG_FILE)
    }

    fn series_path(&self, slug: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.csv", slug))
    }

    fn read_existing(path: &Path) -> Result<Vec<u8>, CacheError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CacheError::NotFound {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    // ===== Catalog =====

    pub fn write_catalog(&self, entities: &[Entity]) -> Result<(), CacheError> {
        let path = self.catalog_path();
        let mut writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(Vec::new());
        for entity in entities {
            writer
                .serialize(entity)
                .map_err(|e| CacheError::io(&path, e.into()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CacheError::io(&path, e.into_error()))?;

        write_atomic(&path, &bytes)?;
        debug!(count = entities.len(), "Catalog cached");
        Ok(())
    }

    pub fn read_catalog(&self) -> Result<Vec<Entity>, CacheError> {
        let path = self.catalog_path();
        let bytes = Self::read_existing(&path)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .from_reader(bytes.as_slice());

        reader
            .deserialize::<Entity>()
            .enumerate()
            .map(|(line_num, result)| {
                result.map_err(|e| {
                    CacheError::malformed(&path, format!("line {}: {}", line_num + 2, e))
                })
            })
            .collect()
    }

    // ===== Series =====

    pub fn has_series(&self, slug: &str) -> bool {
        self.series_path(slug).is_file()
    }

    /// Write a country's series. The header is `country;date` followed by the
    /// union of all variable names, lowercased and sorted.
    pub fn write_series(&self, slug: &str, rows: &[RawSeriesRow]) -> Result<(), CacheError> {
        let path = self.series_path(slug);

        let variables: BTreeSet<String> = rows
            .iter()
            .flat_map(|r| r.variables().map(str::to_string))
            .collect();

        let mut writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(Vec::new());

        let mut header = vec!["country".to_string(), "date".to_string()];
        header.extend(variables.iter().cloned());
        writer
            .write_record(&header)
            .map_err(|e| CacheError::io(&path, e.into()))?;

        for row in rows {
            let mut record = vec![row.country.clone(), row.date.format(DATE_FORMAT).to_string()];
            record.extend(
                variables
                    .iter()
                    .map(|v| row.value(v).map(format_value).unwrap_or_default()),
            );
            writer
                .write_record(&record)
                .map_err(|e| CacheError::io(&path, e.into()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CacheError::io(&path, e.into_error()))?;

        write_atomic(&path, &bytes)?;
        debug!(slug = slug, rows = rows.len(), "Series cached");
        Ok(())
    }

    pub fn read_series(&self, slug: &str) -> Result<Vec<RawSeriesRow>, CacheError> {
        let path = self.series_path(slug);
        let bytes = Self::read_existing(&path)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .from_reader(bytes.as_slice());

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| CacheError::malformed(&path, e))?
            .iter()
            .map(str::to_lowercase)
            .collect();

        let date_col = header
            .iter()
            .position(|h| h == "date")
            .ok_or_else(|| CacheError::malformed(&path, "missing 'date' column"))?;
        let country_col = header
            .iter()
            .position(|h| h == "country")
            .ok_or_else(|| CacheError::malformed(&path, "missing 'country' column"))?;

        let mut rows = Vec::new();
        for (line_num, result) in reader.records().enumerate() {
            let line = line_num + 2;
            let record = result.map_err(|e| CacheError::malformed(&path, format!("line {}: {}", line, e)))?;

            let raw_date = record.get(date_col).unwrap_or("");
            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
                CacheError::malformed(&path, format!("line {}: bad date '{}': {}", line, raw_date, e))
            })?;
            let mut row = RawSeriesRow::new(record.get(country_col).unwrap_or(""), date);

            for (idx, cell) in record.iter().enumerate() {
                if idx == date_col || idx == country_col || cell.is_empty() {
                    continue;
                }
                let value: f64 = cell.parse().map_err(|_| {
                    CacheError::malformed(
                        &path,
                        format!("line {}: non-numeric '{}' in column '{}'", line, cell, header[idx]),
                    )
                })?;
                row = row.with_value(&header[idx], value);
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

/// Counts are written without a trailing `.0`.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    #[test]
    fn test_catalog_round_trip() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let entities = vec![Entity::new("italy", "Italy"), Entity::new("france", "France")];

        cache.write_catalog(&entities).unwrap();
        assert_eq!(cache.read_catalog().unwrap(), entities);

        let raw = std::fs::read_to_string(dir.path().join("countries.csv")).unwrap();
        assert!(raw.starts_with("Slug;Country\n"));
    }

    #[test]
    fn test_missing_catalog_is_not_found() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        assert!(cache.read_catalog().unwrap_err().is_not_found());
    }

    #[test]
    fn test_series_layout_and_round_trip() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let rows = vec![
            RawSeriesRow::new("Italy", day(1))
                .with_value("Confirmed", 10.0)
                .with_value("Deaths", 1.0),
            RawSeriesRow::new("Italy", day(2)).with_value("confirmed", 12.5),
        ];

        cache.write_series("italy", &rows).unwrap();
        assert!(cache.has_series("italy"));

        let raw = std::fs::read_to_string(dir.path().join("italy.csv")).unwrap();
        let mut lines = raw.lines();
        assert_eq!(lines.next(), Some("country;date;confirmed;deaths"));
        assert_eq!(lines.next(), Some("Italy;2020-03-01;10;1"));
        assert_eq!(lines.next(), Some("Italy;2020-03-02;12.5;"));

        assert_eq!(cache.read_series("italy").unwrap(), rows);
    }

    #[test]
    fn test_read_series_lowercases_headers() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(
            dir.path().join("spain.csv"),
            "Country;Date;Active\nSpain;2020-03-01;7\n",
        )
        .unwrap();

        let rows = cache.read_series("spain").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value("active"), Some(7.0));
        assert_eq!(rows[0].date, day(1));
    }

    #[test]
    fn test_mixed_case_variables_are_written() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        let rows = vec![RawSeriesRow::new("Peru", day(1))
            .with_value("Deaths", 3.0)
            .with_value("CONFIRMED", 10.0)];

        cache.write_series("peru", &rows).unwrap();

        let written = std::fs::read_to_string(dir.path().join("peru.csv")).unwrap();
        assert_eq!(written, "country;date;confirmed;deaths\nPeru;2020-03-01;10;3\n");
        let read = cache.read_series("peru").unwrap();
        assert_eq!(read[0].value("Deaths"), Some(3.0));
        assert_eq!(read[0].value("confirmed"), Some(10.0));
    }

    #[test]
    fn test_missing_series_is_not_found() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        assert!(!cache.has_series("peru"));
        assert!(cache.read_series("peru").unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_series_date() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("chile.csv"), "country;date;deaths\nChile;yesterday;3\n").unwrap();

        match cache.read_series("chile") {
            Err(CacheError::MalformedState { detail, .. }) => assert!(detail.contains("yesterday")),
            other => panic!("expected MalformedState, got {:?}", other),
        }
    }

    #[test]
    fn test_series_without_date_column_is_malformed() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("chile.csv"), "country;deaths\nChile;3\n").unwrap();
        assert!(matches!(
            cache.read_series("chile"),
            Err(CacheError::MalformedState { .. })
        ));
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();
        cache.write_series("italy", &[]).unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["italy.csv".to_string()]);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(-3.0), "-3");
        assert_eq!(format_value(0.25), "0.25");
    }
}
