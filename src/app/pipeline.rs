//! Shared "load pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch rows -> normalize -> derive rollups + baseline indices -> stats
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::collections::BTreeSet;

use crate::agg;
use crate::data::{PriceStore, generate_sample};
use crate::domain::{DatasetStats, DerivedSets, PriceRow, RowError, Source};
use crate::error::AppError;

/// All computed outputs of a single load.
///
/// Consumers hold this immutably; a refresh replaces the whole value.
/// That is the session contract: compute once, hand out a read-only
/// handle — the pipeline itself stays stateless and re-callable.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub sets: DerivedSets,
    pub stats: DatasetStats,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Fetch from the configured source and derive the three record sets.
pub fn run_load(source: &Source) -> Result<RunOutput, AppError> {
    match source {
        Source::Postgres => {
            let store = PriceStore::connect_from_env()?;
            let rows = store.fetch_price_rows()?;
            Ok(run_with_rows(rows))
        }
        Source::Sample(config) => {
            let rows = generate_sample(config)?;
            Ok(run_with_rows(rows))
        }
        Source::Snapshot(path) => crate::io::snapshot::read_snapshot(path),
    }
}

/// Derive the record sets from pre-fetched rows.
///
/// Pure and deterministic; useful for the TUI (re-derive without
/// refetching) and for tests. Empty input is valid and yields empty sets.
pub fn run_with_rows(rows: Vec<PriceRow>) -> RunOutput {
    let rows_read = rows.len();
    let (points, row_errors) = agg::normalize_rows(&rows);
    let rows_used = points.len();

    for err in &row_errors {
        tracing::warn!(row = err.index, "excluded row: {}", err.message);
    }

    let sets = agg::derive_sets(points);
    let stats = compute_stats(&sets, rows_used);

    RunOutput {
        sets,
        stats,
        rows_read,
        rows_used,
        row_errors,
    }
}

fn compute_stats(sets: &DerivedSets, n_rows: usize) -> DatasetStats {
    let mut mains: BTreeSet<&str> = BTreeSet::new();
    let mut subs: BTreeSet<&str> = BTreeSet::new();
    let mut sub_subs: BTreeSet<&str> = BTreeSet::new();
    let mut day_min = None;
    let mut day_max = None;

    for rec in &sets.fine {
        mains.insert(rec.main_category.as_str());
        subs.insert(rec.sub_category.as_str());
        sub_subs.insert(rec.sub_sub_category.as_str());
        day_min = Some(day_min.map_or(rec.day, |d: chrono::NaiveDate| d.min(rec.day)));
        day_max = Some(day_max.map_or(rec.day, |d: chrono::NaiveDate| d.max(rec.day)));
    }

    DatasetStats {
        n_rows,
        n_main: mains.len(),
        n_sub: subs.len(),
        n_sub_sub: sub_subs.len(),
        day_min,
        day_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(day: u32, count: Option<i64>, price: Option<f64>) -> PriceRow {
        PriceRow {
            main_category_name: "Bakery".to_string(),
            sub_category_name: "Bread".to_string(),
            sub_sub_category_name: "White Bread".to_string(),
            day: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            count_rows: count,
            avg_price: price,
        }
    }

    #[test]
    fn run_with_rows_tracks_counts_and_stats() {
        let run = run_with_rows(vec![
            row(1, Some(5), Some(2.0)),
            row(3, Some(5), Some(2.2)),
            row(2, None, Some(1.0)),
        ]);

        assert_eq!(run.rows_read, 3);
        assert_eq!(run.rows_used, 2);
        assert_eq!(run.row_errors.len(), 1);
        assert_eq!(run.stats.n_rows, 2);
        assert_eq!(run.stats.n_main, 1);
        assert_eq!(
            run.stats.day_min,
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(
            run.stats.day_max,
            Some(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
        );
    }

    #[test]
    fn empty_load_is_valid() {
        let run = run_with_rows(Vec::new());
        assert_eq!(run.rows_read, 0);
        assert!(run.sets.fine.is_empty());
        assert!(run.sets.sub.is_empty());
        assert!(run.sets.main.is_empty());
        assert_eq!(run.stats.day_min, None);
    }

    #[test]
    fn sample_source_loads_end_to_end() {
        let source = Source::Sample(crate::domain::SampleConfig {
            days: 10,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            seed: 42,
        });
        let run = run_load(&source).unwrap();

        assert!(run.rows_used > 0);
        assert_eq!(run.stats.n_main, 4);
        // Every group's earliest day indexes at 1.0.
        for rec in run.sets.main.iter().filter(|r| {
            Some(r.day) == run.stats.day_min
        }) {
            assert!((rec.baseline_index - 1.0).abs() < 1e-9);
        }
    }
}
