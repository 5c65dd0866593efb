//! Data models for countries and their daily series.
//!
//! - `Entity`, `Catalog`: the countries exposed by the remote source
//! - `RawSeriesRow`: one daily observation as fetched and cached
//! - `TidyRow`: one smoothed `(date, country, variable)` value, ready to render

pub mod entity;
pub mod series;

pub use entity::{Catalog, Entity};
pub use series::{RawSeriesRow, TidyRow, KNOWN_VARIABLES};
