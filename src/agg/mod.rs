//! The aggregation pipeline: one flat fine-grained record set in, three
//! hierarchical derived sets out.
//!
//! Design goals:
//! - **Pure**: no I/O, no state; a deterministic function of the input
//! - **Row-level tolerance**: malformed rows are excluded and reported,
//!   never fatal
//! - **Weighted aggregation**: rollups sum price mass and row counts, so
//!   coarser averages are weighted means rather than means of means
//!
//! The pipeline runs once per data refresh; consumers treat the returned
//! sets as read-only shared data.

pub mod baseline;
pub mod rollup;

use crate::domain::{DerivedSets, FineRecord, PricePoint, PriceRow, RowError};

/// Trim category whitespace and validate numeric fields.
///
/// Grouping keys are the cleaned names, so two rows differing only in
/// incidental padding land in the same group. Rows with missing or invalid
/// numeric fields are excluded from every derived set (they would carry
/// zero usable weight) and reported per-row.
pub fn normalize_rows(rows: &[PriceRow]) -> (Vec<PricePoint>, Vec<RowError>) {
    let mut points = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row) {
            Ok(point) => points.push(point),
            Err(message) => errors.push(RowError { index, message }),
        }
    }

    (points, errors)
}

fn normalize_row(row: &PriceRow) -> Result<PricePoint, String> {
    let count_rows = row
        .count_rows
        .ok_or_else(|| "Missing `count_rows` value.".to_string())?;
    if count_rows < 0 {
        return Err(format!("Invalid `count_rows` {count_rows} (must be >= 0)."));
    }

    let average_price = row
        .avg_price
        .ok_or_else(|| "Missing `avg_price` value.".to_string())?;
    if !average_price.is_finite() || average_price < 0.0 {
        return Err(format!(
            "Invalid `avg_price` {average_price} (must be finite and >= 0)."
        ));
    }

    Ok(PricePoint {
        main_category: row.main_category_name.trim().to_string(),
        sub_category: row.sub_category_name.trim().to_string(),
        sub_sub_category: row.sub_sub_category_name.trim().to_string(),
        day: row.day,
        count_rows,
        average_price,
    })
}

/// Derive the three record sets from normalized points.
///
/// Output ordering is fully specified: fine records sorted by
/// `(main, sub, sub_sub, day)`, rollups by `(group key, day)`. Empty input
/// yields empty sets; a zero baseline price yields non-finite indices for
/// that group and leaves every other group computable.
pub fn derive_sets(points: Vec<PricePoint>) -> DerivedSets {
    let mut fine: Vec<FineRecord> = points
        .into_iter()
        .map(|p| {
            let total_price = p.count_rows as f64 * p.average_price;
            FineRecord {
                main_category: p.main_category,
                sub_category: p.sub_category,
                sub_sub_category: p.sub_sub_category,
                day: p.day,
                count_rows: p.count_rows,
                total_price,
                average_price: p.average_price,
                baseline_index: f64::NAN,
            }
        })
        .collect();

    fine.sort_by(|a, b| {
        (&a.main_category, &a.sub_category, &a.sub_sub_category, a.day).cmp(&(
            &b.main_category,
            &b.sub_category,
            &b.sub_sub_category,
            b.day,
        ))
    });

    baseline::index_fine(&mut fine);

    let mut sub = rollup::roll_up_sub(&fine);
    baseline::index_sub(&mut sub);

    let mut main = rollup::roll_up_main(&fine);
    baseline::index_main(&mut main);

    DerivedSets { fine, sub, main }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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

    fn derive(rows: Vec<PriceRow>) -> DerivedSets {
        let (points, errors) = normalize_rows(&rows);
        assert!(errors.is_empty(), "unexpected row errors: {errors:?}");
        derive_sets(points)
    }

    #[test]
    fn whitespace_collapses_to_one_group() {
        let sets = derive(vec![
            row(" Bakery", "Bread ", " White Bread ", d(1), 5, 2.0),
            row("Bakery ", " Bread", "White Bread", d(1), 5, 2.0),
        ]);

        assert_eq!(sets.fine.len(), 2);
        for rec in &sets.fine {
            assert_eq!(rec.main_category, "Bakery");
            assert_eq!(rec.sub_category, "Bread");
            assert_eq!(rec.sub_sub_category, "White Bread");
        }

        // Both rows roll into one (sub, day) and one (main, day) group.
        assert_eq!(sets.sub.len(), 1);
        assert_eq!(sets.sub[0].total_rows, 10);
        assert_eq!(sets.main.len(), 1);
        assert_eq!(sets.main[0].main_category, "Bakery");
        assert_eq!(sets.main[0].total_rows, 10);
    }

    #[test]
    fn weighted_mean_not_mean_of_means() {
        let sets = derive(vec![
            row("Bakery", "Bread", "White Bread", d(1), 10, 2.0),
            row("Bakery", "Bread", "Sourdough", d(1), 30, 4.0),
        ]);

        assert_eq!(sets.sub.len(), 1);
        let rollup = &sets.sub[0];
        assert_eq!(rollup.total_rows, 40);
        assert!((rollup.total_price - (10.0 * 2.0 + 30.0 * 4.0)).abs() < 1e-9);
        // (10*2.0 + 30*4.0) / 40 = 3.5, not the unweighted 3.0.
        assert!((rollup.average_price - 3.5).abs() < 1e-9);
    }

    #[test]
    fn mass_is_conserved_across_levels() {
        let sets = derive(vec![
            row("Bakery", "Bread", "White Bread", d(1), 10, 2.0),
            row("Bakery", "Bread", "Sourdough", d(1), 30, 4.0),
            row("Bakery", "Pastry", "Croissant", d(1), 7, 1.5),
            row("Dairy", "Milk", "Whole Milk", d(1), 12, 1.1),
            row("Bakery", "Bread", "White Bread", d(2), 4, 2.2),
        ]);

        for main in &sets.main {
            let (rows, mass) = sets
                .fine
                .iter()
                .filter(|f| f.main_category == main.main_category && f.day == main.day)
                .fold((0i64, 0.0f64), |(r, m), f| {
                    (r + f.count_rows, m + f.total_price)
                });
            assert_eq!(main.total_rows, rows);
            assert!((main.total_price - mass).abs() < 1e-9);
        }

        for sub in &sets.sub {
            let (rows, mass) = sets
                .fine
                .iter()
                .filter(|f| f.sub_category == sub.sub_category && f.day == sub.day)
                .fold((0i64, 0.0f64), |(r, m), f| {
                    (r + f.count_rows, m + f.total_price)
                });
            assert_eq!(sub.total_rows, rows);
            assert!((sub.total_price - mass).abs() < 1e-9);
        }
    }

    #[test]
    fn end_to_end_example_holds_at_every_level() {
        let sets = derive(vec![
            row("Bakery", "Bread", "White Bread", d(1), 5, 2.0),
            row("Bakery", "Bread", "White Bread", d(2), 5, 2.2),
        ]);

        assert_eq!(sets.fine.len(), 2);
        assert_eq!(sets.sub.len(), 2);
        assert_eq!(sets.main.len(), 2);

        let fine_avg: Vec<f64> = sets.fine.iter().map(|r| r.average_price).collect();
        let sub_avg: Vec<f64> = sets.sub.iter().map(|r| r.average_price).collect();
        let main_avg: Vec<f64> = sets.main.iter().map(|r| r.average_price).collect();
        for avgs in [fine_avg, sub_avg, main_avg] {
            assert!((avgs[0] - 2.0).abs() < 1e-9);
            assert!((avgs[1] - 2.2).abs() < 1e-9);
        }

        let fine_idx: Vec<f64> = sets.fine.iter().map(|r| r.baseline_index).collect();
        let sub_idx: Vec<f64> = sets.sub.iter().map(|r| r.baseline_index).collect();
        let main_idx: Vec<f64> = sets.main.iter().map(|r| r.baseline_index).collect();
        for idx in [fine_idx, sub_idx, main_idx] {
            assert!((idx[0] - 1.0).abs() < 1e-9);
            assert!((idx[1] - 1.1).abs() < 1e-9);
        }
    }

    #[test]
    fn constant_price_series_indexes_at_one() {
        let sets = derive(vec![
            row("Dairy", "Milk", "Whole Milk", d(1), 10, 1.15),
            row("Dairy", "Milk", "Whole Milk", d(2), 20, 1.15),
            row("Dairy", "Milk", "Whole Milk", d(3), 5, 1.15),
        ]);

        for rec in &sets.fine {
            assert!((rec.baseline_index - 1.0).abs() < 1e-9);
        }
        for rec in &sets.main {
            assert!((rec.baseline_index - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn identical_input_derives_identical_output() {
        let rows = vec![
            row("Bakery", "Bread", "White Bread", d(2), 4, 2.2),
            row("Dairy", "Milk", "Skim Milk", d(1), 9, 0.95),
            row("Bakery", "Bread", "White Bread", d(1), 5, 2.0),
        ];

        let a = derive(rows.clone());
        let b = derive(rows);

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn empty_input_yields_empty_sets() {
        let (points, errors) = normalize_rows(&[]);
        assert!(errors.is_empty());

        let sets = derive_sets(points);
        assert!(sets.fine.is_empty());
        assert!(sets.sub.is_empty());
        assert!(sets.main.is_empty());
    }

    #[test]
    fn zero_baseline_poisons_only_its_own_group() {
        let sets = derive(vec![
            row("Produce", "Fruit", "Bananas", d(1), 10, 0.0),
            row("Produce", "Fruit", "Bananas", d(2), 10, 0.5),
            row("Produce", "Fruit", "Apples", d(1), 10, 2.0),
            row("Produce", "Fruit", "Apples", d(2), 10, 2.1),
        ]);

        for rec in &sets.fine {
            if rec.sub_sub_category == "Bananas" {
                assert!(!rec.baseline_index.is_finite());
            } else {
                assert!(rec.baseline_index.is_finite());
            }
        }

        // The sub-category group mixes both leaves; its own baseline is
        // finite (day-1 weighted average is 1.0, not zero).
        for rec in &sets.sub {
            assert!(rec.baseline_index.is_finite());
        }
    }

    #[test]
    fn malformed_rows_are_excluded_not_fatal() {
        let mut rows = vec![
            row("Bakery", "Bread", "White Bread", d(1), 5, 2.0),
            row("Bakery", "Bread", "White Bread", d(2), 5, 2.2),
        ];
        rows.push(PriceRow {
            count_rows: None,
            ..row("Bakery", "Bread", "White Bread", d(2), 0, 0.0)
        });
        rows.push(PriceRow {
            avg_price: None,
            ..row("Bakery", "Bread", "White Bread", d(2), 3, 0.0)
        });
        rows.push(PriceRow {
            avg_price: Some(f64::NAN),
            ..row("Bakery", "Bread", "White Bread", d(2), 3, 0.0)
        });

        let (points, errors) = normalize_rows(&rows);
        assert_eq!(points.len(), 2);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].index, 2);

        // Sums see only the valid rows.
        let sets = derive_sets(points);
        let day2 = sets.sub.iter().find(|s| s.day == d(2)).unwrap();
        assert_eq!(day2.total_rows, 5);
        assert!((day2.average_price - 2.2).abs() < 1e-9);
    }

    #[test]
    fn zero_count_rows_are_valid_zero_weight() {
        let sets = derive(vec![
            row("Bakery", "Bread", "White Bread", d(1), 0, 9.99),
            row("Bakery", "Bread", "Sourdough", d(1), 10, 2.0),
        ]);

        let rollup = &sets.sub[0];
        assert_eq!(rollup.total_rows, 10);
        assert!((rollup.average_price - 2.0).abs() < 1e-9);
    }

    #[test]
    fn inconsistent_hierarchy_resolves_to_lexicographic_min() {
        let sets = derive(vec![
            row("Pantry", "Bread", "Rye", d(1), 5, 3.0),
            row("Bakery", "Bread", "White Bread", d(1), 5, 2.0),
        ]);

        assert_eq!(sets.sub.len(), 1);
        assert_eq!(sets.sub[0].main_category, "Bakery");
    }

    #[test]
    fn outputs_are_sorted() {
        let sets = derive(vec![
            row("Dairy", "Milk", "Whole Milk", d(2), 1, 1.0),
            row("Bakery", "Pastry", "Croissant", d(1), 1, 1.0),
            row("Bakery", "Bread", "White Bread", d(3), 1, 1.0),
            row("Bakery", "Bread", "White Bread", d(1), 1, 1.0),
        ]);

        let fine_keys: Vec<_> = sets
            .fine
            .iter()
            .map(|r| {
                (
                    r.main_category.clone(),
                    r.sub_category.clone(),
                    r.sub_sub_category.clone(),
                    r.day,
                )
            })
            .collect();
        let mut sorted = fine_keys.clone();
        sorted.sort();
        assert_eq!(fine_keys, sorted);

        let sub_keys: Vec<_> = sets
            .sub
            .iter()
            .map(|r| (r.sub_category.clone(), r.day))
            .collect();
        let mut sorted = sub_keys.clone();
        sorted.sort();
        assert_eq!(sub_keys, sorted);

        let main_keys: Vec<_> = sets
            .main
            .iter()
            .map(|r| (r.main_category.clone(), r.day))
            .collect();
        let mut sorted = main_keys.clone();
        sorted.sort();
        assert_eq!(main_keys, sorted);
    }
}
