//! Weighted rollups to coarser category levels.
//!
//! A rollup sums `total_price` (price mass) and `count_rows` over the
//! group, then divides: `average_price = total_price / total_rows`.
//! Grouping uses `BTreeMap`, so the output comes back deterministically
//! sorted by `(group key, day)` regardless of input order.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{FineRecord, MainRollup, SubRollup};

struct SubAccum {
    total_rows: i64,
    total_price: f64,
    /// Lexicographic minimum of the main categories seen in the group.
    main_category: String,
}

/// Roll fine records up to `(sub_category, day)`.
pub fn roll_up_sub(fine: &[FineRecord]) -> Vec<SubRollup> {
    let mut groups: BTreeMap<(String, NaiveDate), SubAccum> = BTreeMap::new();

    for rec in fine {
        let key = (rec.sub_category.clone(), rec.day);
        match groups.get_mut(&key) {
            Some(acc) => {
                acc.total_rows += rec.count_rows;
                acc.total_price += rec.total_price;
                if rec.main_category < acc.main_category {
                    acc.main_category = rec.main_category.clone();
                }
            }
            None => {
                groups.insert(
                    key,
                    SubAccum {
                        total_rows: rec.count_rows,
                        total_price: rec.total_price,
                        main_category: rec.main_category.clone(),
                    },
                );
            }
        }
    }

    groups
        .into_iter()
        .map(|((sub_category, day), acc)| SubRollup {
            main_category: acc.main_category,
            sub_category,
            day,
            total_rows: acc.total_rows,
            total_price: acc.total_price,
            average_price: acc.total_price / acc.total_rows as f64,
            baseline_index: f64::NAN,
        })
        .collect()
}

/// Roll fine records up to `(main_category, day)`.
pub fn roll_up_main(fine: &[FineRecord]) -> Vec<MainRollup> {
    let mut groups: BTreeMap<(String, NaiveDate), (i64, f64)> = BTreeMap::new();

    for rec in fine {
        let entry = groups
            .entry((rec.main_category.clone(), rec.day))
            .or_insert((0, 0.0));
        entry.0 += rec.count_rows;
        entry.1 += rec.total_price;
    }

    groups
        .into_iter()
        .map(|((main_category, day), (total_rows, total_price))| MainRollup {
            main_category,
            day,
            total_rows,
            total_price,
            average_price: total_price / total_rows as f64,
            baseline_index: f64::NAN,
        })
        .collect()
}
