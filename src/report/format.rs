//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{DerivedSets, Level};
use crate::report::Movers;

/// Format the run summary (source + dataset stats).
pub fn format_run_summary(run: &RunOutput, source: &str) -> String {
    let mut out = String::new();

    out.push_str("=== pw - Retail Price Explorer ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Rows: read={} | used={} | skipped={}\n",
        run.rows_read,
        run.rows_used,
        run.row_errors.len()
    ));

    let days = match (run.stats.day_min, run.stats.day_max) {
        (Some(min), Some(max)) => format!("{min} .. {max}"),
        _ => "-".to_string(),
    };
    out.push_str(&format!("Days: {days}\n"));
    out.push_str(&format!(
        "Groups: main={} | sub={} | sub-sub={}\n",
        run.stats.n_main, run.stats.n_sub, run.stats.n_sub_sub
    ));

    out
}

/// Format the risers/fallers tables for one level.
pub fn format_movers(movers: &Movers, level: Level) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Top risers — {} (latest index vs baseline):\n",
        level.display_name()
    ));
    out.push_str(&format_mover_table(&movers.risers));
    out.push('\n');

    out.push_str(&format!(
        "Top fallers — {} (latest index vs baseline):\n",
        level.display_name()
    ));
    out.push_str(&format_mover_table(&movers.fallers));

    out
}

fn format_mover_table(rows: &[crate::report::Mover]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<28} {:>10} {:>10}\n",
        "category", "day", "index"
    ));
    out.push_str(&format!("{:-<28} {:-<10} {:-<10}\n", "", "", ""));

    for m in rows {
        out.push_str(&format!(
            "{:<28} {:>10} {:>10}\n",
            truncate(&m.label, 28),
            m.day.to_string(),
            fmt_value(m.baseline_index),
        ));
    }

    out
}

/// Format a per-day table at one level: key, day, rows, average price,
/// baseline index.
pub fn format_level_table(
    sets: &DerivedSets,
    level: Level,
    main: Option<&str>,
    sub: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}:\n", level.display_name()));
    out.push_str(&format!(
        "{:<28} {:>10} {:>8} {:>12} {:>10}\n",
        "category", "day", "rows", "avg_price", "index"
    ));
    out.push_str(&format!(
        "{:-<28} {:-<10} {:-<8} {:-<12} {:-<10}\n",
        "", "", "", "", ""
    ));

    match level {
        Level::Main => {
            for rec in &sets.main {
                out.push_str(&format_table_row(
                    &rec.main_category,
                    &rec.day.to_string(),
                    rec.total_rows,
                    rec.average_price,
                    rec.baseline_index,
                ));
            }
        }
        Level::Sub => {
            for rec in &sets.sub {
                if main.is_some_and(|m| rec.main_category != m) {
                    continue;
                }
                out.push_str(&format_table_row(
                    &rec.sub_category,
                    &rec.day.to_string(),
                    rec.total_rows,
                    rec.average_price,
                    rec.baseline_index,
                ));
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
                out.push_str(&format_table_row(
                    &rec.sub_sub_category,
                    &rec.day.to_string(),
                    rec.count_rows,
                    rec.average_price,
                    rec.baseline_index,
                ));
            }
        }
    }

    out
}

fn format_table_row(label: &str, day: &str, rows: i64, avg: f64, index: f64) -> String {
    format!(
        "{:<28} {:>10} {:>8} {:>12} {:>10}\n",
        truncate(label, 28),
        day,
        rows,
        fmt_value(avg),
        fmt_value(index),
    )
}

/// Undefined values (non-finite averages/indices) render as a dash.
fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.4}")
    } else {
        "-".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
