//! Baseline ("relative to earliest day") indexing.
//!
//! For every group at every level the index on day `d` is
//! `average_price(d) / average_price(earliest day present for the group)`,
//! so the earliest day indexes at exactly 1.0. The division is left to
//! IEEE semantics: a zero (or undefined) baseline produces a non-finite
//! index for that group and leaves every other group untouched.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{FineRecord, MainRollup, SubRollup};

/// Attach baseline indices to fine records, grouped by sub-sub category.
///
/// `fine` must already be sorted by `(main, sub, sub_sub, day)`. The same
/// sub-sub category can appear under more than one coarser key in dirty
/// data, so the earliest day is tracked across the whole slice; ties
/// resolve to the first record in sort order.
pub fn index_fine(fine: &mut [FineRecord]) {
    let mut first: BTreeMap<String, (NaiveDate, f64)> = BTreeMap::new();

    for rec in fine.iter() {
        match first.get(&rec.sub_sub_category) {
            Some(&(day, _)) if day <= rec.day => {}
            _ => {
                first.insert(rec.sub_sub_category.clone(), (rec.day, rec.average_price));
            }
        }
    }

    for rec in fine.iter_mut() {
        let (_, base) = first[&rec.sub_sub_category];
        rec.baseline_index = rec.average_price / base;
    }
}

/// Attach baseline indices to sub-category rollups.
///
/// Rollups arrive sorted by `(sub_category, day)`, so the first record of
/// each run is the group's earliest day.
pub fn index_sub(rollups: &mut [SubRollup]) {
    let mut current: Option<String> = None;
    let mut base = f64::NAN;

    for rec in rollups.iter_mut() {
        if current.as_deref() != Some(rec.sub_category.as_str()) {
            current = Some(rec.sub_category.clone());
            base = rec.average_price;
        }
        rec.baseline_index = rec.average_price / base;
    }
}

/// Attach baseline indices to main-category rollups.
pub fn index_main(rollups: &mut [MainRollup]) {
    let mut current: Option<String> = None;
    let mut base = f64::NAN;

    for rec in rollups.iter_mut() {
        if current.as_deref() != Some(rec.main_category.as_str()) {
            current = Some(rec.main_category.clone());
            base = rec.average_price;
        }
        rec.baseline_index = rec.average_price / base;
    }
}
