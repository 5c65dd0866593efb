//! The individual pipeline stages, in the order `transform` runs them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::frame::{Column, Frame};
use crate::models::{RawSeriesRow, TidyRow};

/// Summed variable values per `(date, country key)`, in request order.
pub type Aggregated = BTreeMap<(NaiveDate, String), Vec<f64>>;

/// Keep rows whose lowercased country is one of `entities`.
pub fn filter(rows: Vec<RawSeriesRow>, entities: &[String]) -> Vec<RawSeriesRow> {
    let wanted: BTreeSet<String> = entities.iter().map(|e| e.to_lowercase()).collect();
    rows.into_iter()
        .filter(|r| wanted.contains(&r.country.to_lowercase()))
        .collect()
}

/// Group by `(date, country)` and sum each requested variable. Duplicate
/// observations add up; a variable missing from a row counts as 0.
pub fn aggregate(rows: &[RawSeriesRow], variables: &[String]) -> Aggregated {
    let mut groups = Aggregated::new();
    for row in rows {
        let sums = groups
            .entry((row.date, row.country.to_lowercase()))
            .or_insert_with(|| vec![0.0; variables.len()]);
        for (sum, variable) in sums.iter_mut().zip(variables) {
            *sum += row.value(variable).unwrap_or(0.0);
        }
    }
    groups
}

/// One column per `(variable, country)`, variable-major in request order and
/// countries sorted. Cells of countries without an observation that day are
/// empty.
pub fn pivot(groups: &Aggregated, variables: &[String]) -> Frame<Option<f64>> {
    let entities: BTreeSet<&str> = groups.keys().map(|(_, e)| e.as_str()).collect();
    let dates: BTreeSet<NaiveDate> = groups.keys().map(|(d, _)| *d).collect();

    let mut layout = Vec::new();
    for (var_idx, variable) in variables.iter().enumerate() {
        for entity in &entities {
            layout.push((var_idx, Column::new(variable.clone(), *entity)));
        }
    }

    let mut frame = Frame::new(layout.iter().map(|(_, c)| c.clone()).collect());
    for date in dates {
        let cells = layout
            .iter()
            .map(|(var_idx, column)| {
                groups
                    .get(&(date, column.entity.clone()))
                    .map(|sums| sums[*var_idx])
            })
            .collect();
        frame.rows.push((date, cells));
    }
    frame
}

/// Reindex to one row per calendar day between the first and last date,
/// summing rows that share a day. Days without rows become zeros.
pub fn resample_daily(frame: Frame<Option<f64>>) -> Frame<Option<f64>> {
    let width = frame.columns.len();
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (date, cells) in frame.rows {
        let sums = by_day.entry(date).or_insert_with(|| vec![0.0; width]);
        for (sum, cell) in sums.iter_mut().zip(cells) {
            *sum += cell.unwrap_or(0.0);
        }
    }

    let mut out = Frame::new(frame.columns);
    let (Some(first), Some(last)) = (
        by_day.keys().next().copied(),
        by_day.keys().next_back().copied(),
    ) else {
        return out;
    };

    let mut day = first;
    while day <= last {
        let cells = match by_day.get(&day) {
            Some(sums) => sums.iter().map(|s| Some(*s)).collect(),
            None => vec![Some(0.0); width],
        };
        out.rows.push((day, cells));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    out
}

/// Trailing mean over `window` rows. A row is empty until a full window of
/// values is available, and whenever the window contains an empty cell.
pub fn rolling_mean(frame: Frame<Option<f64>>, window: usize) -> Frame<Option<f64>> {
    let width = frame.columns.len();
    let mut out = Frame::new(frame.columns.clone());

    for (i, (date, _)) in frame.rows.iter().enumerate() {
        let cells = if window == 0 || i + 1 < window {
            vec![None; width]
        } else {
            let span = &frame.rows[i + 1 - window..=i];
            (0..width)
                .map(|col| {
                    span.iter()
                        .map(|(_, cells)| cells[col])
                        .sum::<Option<f64>>()
                        .map(|total| total / window as f64)
                })
                .collect()
        };
        out.rows.push((*date, cells));
    }
    out
}

/// Discard the first `count` rows.
pub fn drop_warmup<T>(mut frame: Frame<T>, count: usize) -> Frame<T> {
    let count = count.min(frame.rows.len());
    frame.rows.drain(..count);
    frame
}

/// Empty cells become 0; values are truncated toward zero and never negative.
pub fn fill_and_cast(frame: Frame<Option<f64>>) -> Frame<i64> {
    Frame {
        columns: frame.columns,
        rows: frame
            .rows
            .into_iter()
            .map(|(date, cells)| {
                let ints = cells
                    .into_iter()
                    .map(|c| (c.unwrap_or(0.0).trunc() as i64).max(0))
                    .collect();
                (date, ints)
            })
            .collect(),
    }
}

pub fn sort_by_date<T>(mut frame: Frame<T>) -> Frame<T> {
    frame.rows.sort_by_key(|(date, _)| *date);
    frame
}

/// Un-pivot to long form: per date, countries ascending, then variables in
/// column order.
pub fn melt(frame: Frame<i64>) -> Vec<TidyRow> {
    let mut order: Vec<usize> = (0..frame.columns.len()).collect();
    order.sort_by(|&a, &b| frame.columns[a].entity.cmp(&frame.columns[b].entity).then(a.cmp(&b)));

    let mut tidy = Vec::with_capacity(frame.rows.len() * order.len());
    for (date, cells) in &frame.rows {
        for &idx in &order {
            let column = &frame.columns[idx];
            tidy.push(TidyRow {
                date: *date,
                entity: column.entity.clone(),
                variable: column.variable.clone(),
                score: cells[idx],
            });
        }
    }
    tidy
}

// ============================================================================
// Tests
// ============================================================================
