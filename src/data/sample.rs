//! Deterministic synthetic retail price data (offline/demo mode).
//!
//! The generator fabricates *already aggregated* rows: one row per
//! sub-sub category per day, with a row count and an average price, the
//! same shape `agg_prices` has. Prices follow a seeded geometric walk so
//! every category drifts differently but the whole dataset is reproducible
//! from `(seed, days, start)`.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{PriceRow, SampleConfig};
use crate::error::AppError;

/// Fixed three-level retail catalog: (main, sub, leaves).
const CATALOG: &[(&str, &str, &[&str])] = &[
    ("Bakery", "Bread", &["White Bread", "Whole Wheat", "Sourdough"]),
    ("Bakery", "Pastry", &["Croissant", "Danish"]),
    ("Beverages", "Juice", &["Orange Juice", "Apple Juice"]),
    ("Beverages", "Soda", &["Cola", "Lemonade"]),
    ("Dairy", "Cheese", &["Cheddar", "Gouda", "Mozzarella"]),
    ("Dairy", "Milk", &["Skim Milk", "Whole Milk"]),
    ("Produce", "Fruit", &["Apples", "Bananas", "Oranges"]),
    ("Produce", "Vegetables", &["Carrots", "Tomatoes"]),
];

/// Generate one row per catalog leaf per day.
pub fn generate_sample(config: &SampleConfig) -> Result<Vec<PriceRow>, AppError> {
    if config.days == 0 {
        return Err(AppError::new(2, "Sample day count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let n_leaves: usize = CATALOG.iter().map(|(_, _, leaves)| leaves.len()).sum();
    let mut rows = Vec::with_capacity(n_leaves * config.days);

    for (main, sub, leaves) in CATALOG {
        for leaf in *leaves {
            let mut price: f64 = rng.gen_range(0.8..12.0);
            // Per-leaf drift and volatility, so some categories trend up,
            // some down, some stay flat.
            let drift: f64 = rng.gen_range(-0.002..0.003);
            let vol: f64 = rng.gen_range(0.005..0.02);

            for offset in 0..config.days {
                let day = day_at(config.start, offset);
                let z: f64 = noise.sample(&mut rng);
                price *= (drift + vol * z).exp();
                let count: i64 = rng.gen_range(20..400);

                rows.push(PriceRow {
                    main_category_name: (*main).to_string(),
                    sub_category_name: (*sub).to_string(),
                    sub_sub_category_name: (*leaf).to_string(),
                    day,
                    count_rows: Some(count),
                    avg_price: Some(price),
                });
            }
        }
    }

    Ok(rows)
}

fn day_at(start: NaiveDate, offset: usize) -> NaiveDate {
    start
        .checked_add_signed(Duration::days(offset as i64))
        .unwrap_or(start)
}
