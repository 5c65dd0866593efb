//! Reshapes cached series into smoothed, long-format rows.
//!
//! `transform` is a pure function running the stages in [`stages`] in order:
//! filter, aggregate, pivot, daily resample, 7-day trailing mean, warm-up
//! drop, fill and cast, sort, melt. Each stage is public so it can be
//! exercised on its own.

pub mod frame;
pub mod stages;

pub use frame::{Column, Frame};

use crate::models::{RawSeriesRow, TidyRow};

/// Width of the trailing moving average, in days.
pub const SMOOTHING_WINDOW: usize = 7;

/// Leading rows without a full window.
pub const WARMUP_ROWS: usize = SMOOTHING_WINDOW - 1;

/// Turn raw observations into smoothed long-format rows for the requested
/// countries (lowercase names) and variables.
pub fn transform(rows: Vec<RawSeriesRow>, entities: &[String], variables: &[String]) -> Vec<TidyRow> {
    let variables = unique_lowercase(variables);
    let entities = unique_lowercase(entities);

    let rows = stages::filter(rows, &entities);
    let groups = stages::aggregate(&rows, &variables);
    let wide = stages::pivot(&groups, &variables);
    let daily = stages::resample_daily(wide);
    let smoothed = stages::rolling_mean(daily, SMOOTHING_WINDOW);
    let trimmed = stages::drop_warmup(smoothed, WARMUP_ROWS);
    let counts = stages::fill_and_cast(trimmed);
    let sorted = stages::sort_by_date(counts);
    stages::melt(sorted)
}

/// Lowercase names with repeats removed, first occurrence kept.
fn unique_lowercase(names: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names.iter().map(|n| n.to_lowercase()) {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn series(country: &str, variable: &str, values: &[f64]) -> Vec<RawSeriesRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                RawSeriesRow::new(country, start() + Duration::days(i as i64)).with_value(variable, *v)
            })
            .collect()
    }

    #[test]
    fn test_italy_eight_days() {
        let rows = series("italy", "confirmed", &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
        let tidy = transform(rows, &strings(&["italy"]), &strings(&["confirmed"]));

        assert_eq!(
            tidy,
            vec![
                TidyRow {
                    date: start() + Duration::days(6),
                    entity: "italy".into(),
                    variable: "confirmed".into(),
                    score: 40,
                },
                TidyRow {
                    date: start() + Duration::days(7),
                    entity: "italy".into(),
                    variable: "confirmed".into(),
                    score: 50,
                },
            ]
        );
    }

    #[test]
    fn test_dense_row_count() {
        let days = 20;
        let values: Vec<f64> = (0..days).map(|i| (i * 3) as f64).collect();
        let mut rows = Vec::new();
        for country in ["Italy", "France", "Spain"] {
            for variable in ["confirmed", "deaths"] {
                rows.extend(series(country, variable, &values));
            }
        }

        let tidy = transform(
            rows,
            &strings(&["italy", "france", "spain"]),
            &strings(&["confirmed", "deaths"]),
        );
        assert_eq!(tidy.len(), 2 * 3 * (days - 6));
    }

    #[test]
    fn test_output_bounds_and_determinism() {
        let mut rows = series("Peru", "deaths", &[5.0, 0.0, 9.0, 1.0, 4.0, 4.0, 12.0, 3.0, 8.0, 2.0]);
        rows.extend(series("Chile", "deaths", &[1.0, 1.0, 1.0]));
        let entities = strings(&["peru", "chile"]);
        let variables = strings(&["deaths"]);

        let first = transform(rows.clone(), &entities, &variables);
        let second = transform(rows, &entities, &variables);
        assert_eq!(first, second);

        let earliest = start() + Duration::days(6);
        let latest = start() + Duration::days(9);
        assert!(!first.is_empty());
        for row in &first {
            assert!(row.score >= 0);
            assert!(row.date >= earliest && row.date <= latest, "{:?}", row);
        }
    }

    #[test]
    fn test_gap_days_count_as_zero() {
        // Observations on day 1 and day 8 only: 7 for the day-7 window, then
        // (0 * 5 + 0 + 14) / 7 = 2 for day 8.
        let rows = vec![
            RawSeriesRow::new("Italy", start()).with_value("deaths", 49.0),
            RawSeriesRow::new("Italy", start() + Duration::days(7)).with_value("deaths", 14.0),
        ];
        let tidy = transform(rows, &strings(&["italy"]), &strings(&["deaths"]));
        let scores: Vec<i64> = tidy.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![7, 2]);
    }

    #[test]
    fn test_unrequested_countries_excluded() {
        let mut rows = series("Italy", "deaths", &[7.0; 7]);
        rows.extend(series("France", "deaths", &[70.0; 7]));
        let tidy = transform(rows, &strings(&["italy"]), &strings(&["DEATHS"]));
        assert_eq!(tidy.len(), 1);
        assert_eq!(tidy[0].entity, "italy");
        assert_eq!(tidy[0].variable, "deaths");
        assert_eq!(tidy[0].score, 7);
    }

    #[test]
    fn test_repeated_names_yield_one_row_per_key() {
        let rows = series("Italy", "deaths", &[7.0; 7]);
        let tidy = transform(
            rows,
            &strings(&["italy", "Italy"]),
            &strings(&["deaths", "confirmed", "Deaths"]),
        );

        let keys: Vec<(&str, &str)> = tidy
            .iter()
            .map(|r| (r.entity.as_str(), r.variable.as_str()))
            .collect();
        assert_eq!(keys, vec![("italy", "deaths"), ("italy", "confirmed")]);
        assert_eq!(tidy[0].score, 7);
        assert_eq!(tidy[1].score, 0);
    }

    #[test]
    fn test_short_series_yields_nothing() {
        let rows = series("Italy", "deaths", &[1.0, 2.0, 3.0]);
        assert!(transform(rows, &strings(&["italy"]), &strings(&["deaths"])).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(transform(Vec::new(), &strings(&["italy"]), &strings(&["deaths"])).is_empty());
    }
}
