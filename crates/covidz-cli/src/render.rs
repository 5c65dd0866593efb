//! Text rendering of smoothed series.
//!
//! One block per variable: a date column followed by one column per country.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use covidz_core::TidyRow;

/// Minimum width of a country column.
const MIN_COLUMN_WIDTH: usize = 8;

pub fn render(rows: &[TidyRow], variables: &[String], entities: &[String]) -> String {
    if rows.is_empty() {
        return "no data to show (a 7-day average needs at least 7 days of cached data)\n".to_string();
    }

    let mut out = String::new();
    for variable in variables {
        let mut by_date: BTreeMap<NaiveDate, BTreeMap<&str, i64>> = BTreeMap::new();
        for row in rows.iter().filter(|r| &r.variable == variable) {
            by_date
                .entry(row.date)
                .or_default()
                .insert(row.entity.as_str(), row.score);
        }

        let widths: Vec<usize> = entities
            .iter()
            .map(|e| e.chars().count().max(MIN_COLUMN_WIDTH))
            .collect();

        out.push_str(&format!("### {}\n", variable));
        out.push_str(&format!("{:<10}", "date"));
        for (entity, width) in entities.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", entity, width = *width));
        }
        out.push('\n');

        for (date, scores) in &by_date {
            out.push_str(&date.format("%Y-%m-%d").to_string());
            for (entity, width) in entities.iter().zip(&widths) {
                let cell = scores
                    .get(entity.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                out.push_str(&format!("  {:>width$}", cell, width = *width));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(d: u32, entity: &str, variable: &str, score: i64) -> TidyRow {
        TidyRow {
            date: NaiveDate::from_ymd_opt(2020, 3, d).unwrap(),
            entity: entity.to_string(),
            variable: variable.to_string(),
            score,
        }
    }

    #[test]
    fn test_render_table() {
        let rows = vec![
            row(7, "france", "deaths", 3),
            row(7, "italy", "deaths", 40),
            row(8, "france", "deaths", 4),
        ];
        let text = render(&rows, &["deaths".to_string()], &["italy".to_string(), "france".to_string()]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "### deaths");
        assert_eq!(lines[1], "date           italy    france");
        assert_eq!(lines[2], "2020-03-07        40         3");
        assert_eq!(lines[3], "2020-03-08         -         4");
    }

    #[test]
    fn test_render_empty() {
        assert!(render(&[], &["deaths".to_string()], &["italy".to_string()]).starts_with("no data"));
    }
}
