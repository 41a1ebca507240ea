//! Selection and ranking over the derived sets.
//!
//! These helpers are the read-only "downstream" of the pipeline: the report
//! command and the TUI both consume the derived sets through them. Selected
//! category values are compared as data (structural equality on the cleaned
//! names), never interpolated into query strings, so names containing
//! quotes or other metacharacters behave like any other name.

pub mod format;

use chrono::NaiveDate;

use crate::domain::{DerivedSets, Level, ValueMode};

/// One chartable/tabulable series: a labeled, day-ordered value list.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Unique main categories, in sorted order.
pub fn unique_mains(sets: &DerivedSets) -> Vec<String> {
    // Main rollups are sorted by (main, day); one entry per run.
    let mut out: Vec<String> = Vec::new();
    for rec in &sets.main {
        if out.last().map(String::as_str) != Some(rec.main_category.as_str()) {
            out.push(rec.main_category.clone());
        }
    }
    out
}

/// Sub categories under a main category, in sorted order.
pub fn subs_under(sets: &DerivedSets, main: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for rec in &sets.sub {
        if rec.main_category == main
            && out.last().map(String::as_str) != Some(rec.sub_category.as_str())
        {
            out.push(rec.sub_category.clone());
        }
    }
    out
}

/// Extract one series per category at `level`, filtered by the selected
/// coarser keys and valued per `mode`.
///
/// `None` filters select everything at that position. Non-finite values
/// (undefined baseline indices) are kept; consumers decide whether to show
/// or skip them.
pub fn level_series(
    sets: &DerivedSets,
    level: Level,
    main: Option<&str>,
    sub: Option<&str>,
    mode: ValueMode,
) -> Vec<Series> {
    let mut out: Vec<Series> = Vec::new();

    match level {
        Level::Main => {
            for rec in &sets.main {
                let value = match mode {
                    ValueMode::Absolute => rec.average_price,
                    ValueMode::Relative => rec.baseline_index,
                };
                push_point(&mut out, &rec.main_category, rec.day, value);
            }
        }
        Level::Sub => {
            for rec in &sets.sub {
                if main.is_some_and(|m| rec.main_category != m) {
                    continue;
                }
                let value = match mode {
                    ValueMode::Absolute => rec.average_price,
                    ValueMode::Relative => rec.baseline_index,
                };
                push_point(&mut out, &rec.sub_category, rec.day, value);
            }
        }
        Level::SubSub => {
            for rec in &sets.fine {
                if main.is_some_and(|m| rec.main_category != m) {
                    continue;
                }
                if sub.is_some_and(|s| rec.sub_category != s) {
                    continue;
                }
                let value = match mode {
                    ValueMode::Absolute => rec.average_price,
                    ValueMode::Relative => rec.baseline_index,
                };
                push_point(&mut out, &rec.sub_sub_category, rec.day, value);
            }
        }
    }

    out
}

fn push_point(out: &mut Vec<Series>, label: &str, day: NaiveDate, value: f64) {
    match out.iter_mut().find(|s| s.label == label) {
        Some(series) => series.points.push((day, value)),
        None => out.push(Series {
            label: label.to_string(),
            points: vec![(day, value)],
        }),
    }
}

/// A group's most recent finite baseline index.
#[derive(Debug, Clone)]
pub struct Mover {
    pub label: String,
    pub day: NaiveDate,
    pub baseline_index: f64,
}

/// Risers and fallers at a level, ranked by latest baseline index.
#[derive(Debug, Clone)]
pub struct Movers {
    pub risers: Vec<Mover>,
    pub fallers: Vec<Mover>,
}

/// Rank the top risers and fallers by each group's latest finite index.
///
/// Groups with no finite index at all (e.g. a zero baseline) are skipped.
pub fn rank_movers(sets: &DerivedSets, level: Level, top_n: usize) -> Movers {
    let series = level_series(sets, level, None, None, ValueMode::Relative);

    let mut latest: Vec<Mover> = Vec::new();
    for s in &series {
        let newest = s
            .points
            .iter()
            .filter(|(_, v)| v.is_finite())
            .max_by_key(|(day, _)| *day);
        if let Some(&(day, value)) = newest {
            latest.push(Mover {
                label: s.label.clone(),
                day,
                baseline_index: value,
            });
        }
    }

    let mut risers = latest.clone();
    risers.sort_by(|a, b| {
        b.baseline_index
            .partial_cmp(&a.baseline_index)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    risers.truncate(top_n);

    let mut fallers = latest;
    fallers.sort_by(|a, b| {
        a.baseline_index
            .partial_cmp(&b.baseline_index)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fallers.truncate(top_n);

    Movers { risers, fallers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg;
    use crate::domain::PriceRow;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn row(
        main: &str,
        sub: &str,
        sub_sub: &str,
        day: NaiveDate,
        count: i64,
        price: f64,
    ) -> PriceRow {
        PriceRow {
            main_category_name: main.to_string(),
            sub_category_name: sub.to_string(),
            sub_sub_category_name: sub_sub.to_string(),
            day,
            count_rows: Some(count),
            avg_price: Some(price),
        }
    }

    fn sets(rows: Vec<PriceRow>) -> DerivedSets {
        let (points, _) = agg::normalize_rows(&rows);
        agg::derive_sets(points)
    }

    #[test]
    fn mains_and_subs_are_sorted_and_unique() {
        let sets = sets(vec![
            row("Dairy", "Milk", "Whole Milk", d(1), 1, 1.0),
            row("Bakery", "Pastry", "Croissant", d(1), 1, 1.0),
            row("Bakery", "Bread", "White Bread", d(1), 1, 1.0),
            row("Bakery", "Bread", "White Bread", d(2), 1, 1.0),
        ]);

        assert_eq!(unique_mains(&sets), vec!["Bakery", "Dairy"]);
        assert_eq!(subs_under(&sets, "Bakery"), vec!["Bread", "Pastry"]);
        assert_eq!(subs_under(&sets, "Dairy"), vec!["Milk"]);
        assert!(subs_under(&sets, "Frozen").is_empty());
    }

    #[test]
    fn series_filters_are_structural_not_textual() {
        // A name carrying a quote is just a string; it must filter exactly.
        let quoted = "Bob's \"Best\" Bread";
        let sets = sets(vec![
            row("Bakery", quoted, "Rolls", d(1), 1, 1.0),
            row("Bakery", "Bread", "White Bread", d(1), 1, 1.0),
        ]);

        let series = level_series(&sets, Level::SubSub, Some("Bakery"), Some(quoted), ValueMode::Absolute);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].label, "Rolls");
    }

    #[test]
    fn series_points_are_day_ordered() {
        let sets = sets(vec![
            row("Bakery", "Bread", "White Bread", d(3), 1, 1.2),
            row("Bakery", "Bread", "White Bread", d(1), 1, 1.0),
            row("Bakery", "Bread", "White Bread", d(2), 1, 1.1),
        ]);

        let series = level_series(&sets, Level::Main, None, None, ValueMode::Absolute);
        assert_eq!(series.len(), 1);
        let days: Vec<NaiveDate> = series[0].points.iter().map(|&(day, _)| day).collect();
        assert_eq!(days, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn movers_rank_by_latest_index() {
        let sets = sets(vec![
            row("Bakery", "Bread", "White Bread", d(1), 10, 2.0),
            row("Bakery", "Bread", "White Bread", d(2), 10, 2.4), // +20%
            row("Dairy", "Milk", "Whole Milk", d(1), 10, 1.0),
            row("Dairy", "Milk", "Whole Milk", d(2), 10, 0.9), // -10%
            row("Produce", "Fruit", "Apples", d(1), 10, 3.0),
            row("Produce", "Fruit", "Apples", d(2), 10, 3.0), // flat
        ]);

        let movers = rank_movers(&sets, Level::Main, 2);
        assert_eq!(movers.risers[0].label, "Bakery");
        assert!((movers.risers[0].baseline_index - 1.2).abs() < 1e-9);
        assert_eq!(movers.fallers[0].label, "Dairy");
        assert!((movers.fallers[0].baseline_index - 0.9).abs() < 1e-9);
        assert_eq!(movers.risers.len(), 2);
    }

    #[test]
    fn movers_skip_groups_with_no_finite_index() {
        let sets = sets(vec![
            row("Bakery", "Bread", "White Bread", d(1), 10, 0.0),
            row("Bakery", "Bread", "White Bread", d(2), 10, 2.0),
            row("Dairy", "Milk", "Whole Milk", d(1), 10, 1.0),
        ]);

        let movers = rank_movers(&sets, Level::SubSub, 5);
        assert_eq!(movers.risers.len(), 1);
        assert_eq!(movers.risers[0].label, "Whole Milk");
    }
}
