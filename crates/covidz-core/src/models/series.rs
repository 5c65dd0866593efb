use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

/// Variables the front end lets users plot.
pub const KNOWN_VARIABLES: [&str; 4] = ["active", "deaths", "recovered", "confirmed"];

/// One daily observation for a country.
///
/// Every numeric field of the source object is kept, keyed by its lowercase
/// name. Missing variables are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeriesRow {
    pub country: String,
    pub date: NaiveDate,
    values: BTreeMap<String, f64>,
}

impl RawSeriesRow {
    pub fn new(country: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            country: country.into(),
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, variable: &str, value: f64) -> Self {
        self.values.insert(variable.to_lowercase(), value);
        self
    }

    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values.get(&variable.to_lowercase()).copied()
    }

    /// Lowercase names of the variables present in this row, sorted.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Build a row from one object of the `dayone/country/{slug}` response.
    ///
    /// Field names are lowercased. Non-numeric fields other than `Country`
    /// and `Date` (province, lat/lon strings, ids) are not kept.
    pub fn from_api_object(object: &Map<String, Value>) -> Result<Self, String> {
        let mut country = None;
        let mut date = None;
        let mut values = BTreeMap::new();

        for (key, value) in object {
            let key = key.to_lowercase();
            match key.as_str() {
                "country" => country = value.as_str().map(str::to_string),
                "date" => {
                    let raw = value
                        .as_str()
                        .ok_or_else(|| format!("Date is not a string: {}", value))?;
                    date = Some(parse_api_date(raw)?);
                }
                _ => {
                    if let Some(n) = value.as_f64() {
                        values.insert(key, n);
                    }
                }
            }
        }

        Ok(Self {
            country: country.ok_or("observation without Country")?,
            date: date.ok_or("observation without Date")?,
            values,
        })
    }
}

/// Parse the source's `Date` field: an RFC 3339 timestamp
/// (`2020-03-01T00:00:00Z`) or a plain `YYYY-MM-DD`.
pub fn parse_api_date(raw: &str) -> Result<NaiveDate, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .ok_or_else(|| format!("unrecognized date '{}'", raw))
}

/// One smoothed value in long form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TidyRow {
    pub date: NaiveDate,
    pub entity: String,
    pub variable: String,
    pub score: i64,
}
