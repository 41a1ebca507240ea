//! Export the derived record sets to CSV.
//!
//! One file per level (`fine.csv`, `sub.csv`, `main.csv`), meant to be easy
//! to consume in spreadsheets or downstream scripts. Undefined values
//! (non-finite indices) are written as empty fields.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::DerivedSets;
use crate::error::AppError;

/// Write the three derived sets into `dir`, returning the file paths.
pub fn write_csv_exports(dir: &Path, sets: &DerivedSets) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create export dir '{}': {e}", dir.display()),
        )
    })?;

    let fine_path = dir.join("fine.csv");
    write_fine_csv(&fine_path, sets)?;
    let sub_path = dir.join("sub.csv");
    write_sub_csv(&sub_path, sets)?;
    let main_path = dir.join("main.csv");
    write_main_csv(&main_path, sets)?;

    Ok(vec![fine_path, sub_path, main_path])
}

fn write_fine_csv(path: &Path, sets: &DerivedSets) -> Result<(), AppError> {
    let mut file = create(path)?;

    writeln!(
        file,
        "main_category,sub_category,sub_sub_category,day,count_rows,total_price,average_price,baseline_index"
    )
    .map_err(|e| write_err(path, e))?;

    for rec in &sets.fine {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            csv_field(&rec.main_category),
            csv_field(&rec.sub_category),
            csv_field(&rec.sub_sub_category),
            rec.day,
            rec.count_rows,
            fmt_f64(rec.total_price),
            fmt_f64(rec.average_price),
            fmt_f64(rec.baseline_index),
        )
        .map_err(|e| write_err(path, e))?;
    }

    Ok(())
}

fn write_sub_csv(path: &Path, sets: &DerivedSets) -> Result<(), AppError> {
    let mut file = create(path)?;

    writeln!(
        file,
        "main_category,sub_category,day,total_rows,total_price,average_price,baseline_index"
    )
    .map_err(|e| write_err(path, e))?;

    for rec in &sets.sub {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            csv_field(&rec.main_category),
            csv_field(&rec.sub_category),
            rec.day,
            rec.total_rows,
            fmt_f64(rec.total_price),
            fmt_f64(rec.average_price),
            fmt_f64(rec.baseline_index),
        )
        .map_err(|e| write_err(path, e))?;
    }

    Ok(())
}

fn write_main_csv(path: &Path, sets: &DerivedSets) -> Result<(), AppError> {
    let mut file = create(path)?;

    writeln!(
        file,
        "main_category,day,total_rows,total_price,average_price,baseline_index"
    )
    .map_err(|e| write_err(path, e))?;

    for rec in &sets.main {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            csv_field(&rec.main_category),
            rec.day,
            rec.total_rows,
            fmt_f64(rec.total_price),
            fmt_f64(rec.average_price),
            fmt_f64(rec.baseline_index),
        )
        .map_err(|e| write_err(path, e))?;
    }

    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })
}

fn write_err(path: &Path, e: std::io::Error) -> AppError {
    AppError::new(
        2,
        format!("Failed to write export CSV '{}': {e}", path.display()),
    )
}

/// Quote a field if it contains CSV metacharacters.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn fmt_f64(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg;
    use crate::domain::PriceRow;
    use chrono::NaiveDate;

    #[test]
    fn exports_all_three_levels() {
        let rows = vec![
            PriceRow {
                main_category_name: "Bakery".to_string(),
                sub_category_name: "Bread".to_string(),
                sub_sub_category_name: "White Bread".to_string(),
                day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                count_rows: Some(5),
                avg_price: Some(2.0),
            },
            PriceRow {
                main_category_name: "Bakery".to_string(),
                sub_category_name: "Bread".to_string(),
                sub_sub_category_name: "White Bread".to_string(),
                day: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                count_rows: Some(5),
                avg_price: Some(2.2),
            },
        ];
        let (points, _) = agg::normalize_rows(&rows);
        let sets = agg::derive_sets(points);

        let dir = tempfile::tempdir().unwrap();
        let paths = write_csv_exports(dir.path(), &sets).unwrap();
        assert_eq!(paths.len(), 3);

        let fine = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(fine.starts_with("main_category,"));
        // Header + two records.
        assert_eq!(fine.lines().count(), 3);
        assert!(fine.contains("White Bread"));

        let main = std::fs::read_to_string(&paths[2]).unwrap();
        assert!(main.contains("1.100000"));
    }

    #[test]
    fn quoted_names_and_undefined_indices_are_safe() {
        assert_eq!(csv_field("Bob's Bread"), "Bob's Bread");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(fmt_f64(f64::NAN), "");
        assert_eq!(fmt_f64(2.5), "2.500000");
    }
}
