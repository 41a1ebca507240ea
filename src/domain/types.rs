//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation
//! - exported to CSV/JSON snapshots
//! - reloaded later for viewing without a database

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Category hierarchy level selected for viewing.
///
/// The hierarchy is fixed at three levels: main category > sub category >
/// sub-sub category. Finer levels exist only under a chosen coarser key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    Main,
    Sub,
    SubSub,
}

impl Level {
    /// Human-readable label for selectors and terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Level::Main => "Main Categories",
            Level::Sub => "Sub Categories",
            Level::SubSub => "Sub Sub Categories",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Level::Main => Level::Sub,
            Level::Sub => Level::SubSub,
            Level::SubSub => Level::Main,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Level::Main => Level::SubSub,
            Level::Sub => Level::Main,
            Level::SubSub => Level::Sub,
        }
    }
}

/// Which y-value to chart/tabulate.
///
/// `Relative` is the default: each group is shown relative to its own
/// earliest-day price, which makes groups of very different price levels
/// comparable on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    Absolute,
    Relative,
}

impl ValueMode {
    pub fn display_name(self) -> &'static str {
        match self {
            ValueMode::Absolute => "Absolute",
            ValueMode::Relative => "Relative",
        }
    }

    /// Y-axis label for charts.
    pub fn axis_label(self) -> &'static str {
        match self {
            ValueMode::Absolute => "avg price",
            ValueMode::Relative => "index (baseline = 1)",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ValueMode::Absolute => ValueMode::Relative,
            ValueMode::Relative => ValueMode::Absolute,
        }
    }
}

/// Where the fine-grained rows come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// The `agg_prices` table of the Postgres database configured in the
    /// environment.
    Postgres,
    /// Deterministic synthetic data (offline/demo mode).
    Sample(SampleConfig),
    /// A previously exported snapshot JSON (already-derived sets).
    Snapshot(PathBuf),
}

/// Knobs for the synthetic sample source.
#[derive(Debug, Clone, Copy)]
pub struct SampleConfig {
    pub days: usize,
    pub start: NaiveDate,
    pub seed: u64,
}

/// A raw row of the `agg_prices` table.
///
/// Numeric fields are optional because upstream aggregation jobs can leave
/// them NULL; such rows are excluded during normalization rather than
/// propagated into weighted sums.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub main_category_name: String,
    pub sub_category_name: String,
    pub sub_sub_category_name: String,
    pub day: NaiveDate,
    pub count_rows: Option<i64>,
    pub avg_price: Option<f64>,
}

/// A normalized fine-grained observation used for aggregation.
///
/// Category names are whitespace-trimmed (they are grouping keys), and the
/// numeric fields are present, finite, and non-negative.
#[derive(Debug, Clone)]
pub struct PricePoint {
    pub main_category: String,
    pub sub_category: String,
    pub sub_sub_category: String,
    pub day: NaiveDate,
    pub count_rows: i64,
    pub average_price: f64,
}

/// Finest-level derived record (one per surviving input row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FineRecord {
    pub main_category: String,
    pub sub_category: String,
    pub sub_sub_category: String,
    pub day: NaiveDate,
    pub count_rows: i64,
    /// Price mass: `count_rows * average_price`. Carrying this (instead of
    /// the bare average) is what makes coarser rollups weighted means.
    pub total_price: f64,
    pub average_price: f64,
    /// `average_price / average_price(earliest day of this sub-sub
    /// category)`. Non-finite when the baseline price is zero.
    #[serde(with = "f64_nullable")]
    pub baseline_index: f64,
}

/// Sub-category rollup for one `(sub_category, day)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRollup {
    /// Lexicographic minimum of the main categories observed in the group.
    /// In clean data the mapping is one-to-one and this is just "the" main
    /// category; in dirty data the pick is deterministic.
    pub main_category: String,
    pub sub_category: String,
    pub day: NaiveDate,
    pub total_rows: i64,
    pub total_price: f64,
    #[serde(with = "f64_nullable")]
    pub average_price: f64,
    #[serde(with = "f64_nullable")]
    pub baseline_index: f64,
}

/// Main-category rollup for one `(main_category, day)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainRollup {
    pub main_category: String,
    pub day: NaiveDate,
    pub total_rows: i64,
    pub total_price: f64,
    #[serde(with = "f64_nullable")]
    pub average_price: f64,
    #[serde(with = "f64_nullable")]
    pub baseline_index: f64,
}

/// The three derived record sets the pipeline produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedSets {
    pub fine: Vec<FineRecord>,
    pub sub: Vec<SubRollup>,
    pub main: Vec<MainRollup>,
}

/// Summary stats about the rows that survived normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub n_main: usize,
    pub n_sub: usize,
    pub n_sub_sub: usize,
    pub day_min: Option<NaiveDate>,
    pub day_max: Option<NaiveDate>,
}

/// A row-level error encountered during normalization.
#[derive(Debug, Clone)]
pub struct RowError {
    /// 0-based index of the row within the fetched result set.
    pub index: usize,
    pub message: String,
}

/// Serde adapter for `f64` fields that may legitimately be non-finite.
///
/// JSON has no representation for NaN/inf; an undefined baseline index is
/// written as `null` and read back as NaN so snapshots round-trip.
mod f64_nullable {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, ser: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            ser.serialize_some(v)
        } else {
            ser.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(de)?.unwrap_or(f64::NAN))
    }
}
