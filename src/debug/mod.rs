//! Debug bundle writer for inspecting a load and its derived sets.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::Level;
use crate::error::AppError;
use crate::report;

const MAX_ROW_ERRORS: usize = 20;

/// Write a timestamped markdown bundle under `debug/` and return its path.
pub fn write_debug_bundle(run: &RunOutput) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir)
        .map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("pw_debug_{ts}.md"));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;

    let mut out = String::new();
    out.push_str("# pw debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!(
        "- rows: read={} used={} skipped={}\n",
        run.rows_read,
        run.rows_used,
        run.row_errors.len()
    ));
    let days = match (run.stats.day_min, run.stats.day_max) {
        (Some(min), Some(max)) => format!("{min} .. {max}"),
        _ => "-".to_string(),
    };
    out.push_str(&format!("- days: {days}\n"));
    out.push_str(&format!(
        "- groups: main={} sub={} sub-sub={}\n",
        run.stats.n_main, run.stats.n_sub, run.stats.n_sub_sub
    ));

    out.push_str("\n## Row errors\n");
    if run.row_errors.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str("| row | message |\n");
        out.push_str("| - | - |\n");
        for err in run.row_errors.iter().take(MAX_ROW_ERRORS) {
            out.push_str(&format!("| {} | {} |\n", err.index, err.message));
        }
        if run.row_errors.len() > MAX_ROW_ERRORS {
            out.push_str(&format!(
                "... and {} more\n",
                run.row_errors.len() - MAX_ROW_ERRORS
            ));
        }
    }

    for level in [Level::Main, Level::Sub, Level::SubSub] {
        let movers = report::rank_movers(&run.sets, level, 10);

        out.push_str(&format!("\n## Movers — {}\n", level.display_name()));
        out.push_str("| category | day | latest index |\n");
        out.push_str("| - | - | - |\n");
        for m in &movers.risers {
            out.push_str(&format!(
                "| {} | {} | {:.4} |\n",
                m.label, m.day, m.baseline_index
            ));
        }
        for m in movers.fallers.iter().rev() {
            // Fallers in ascending-index order continue the table bottom-up;
            // skip entries already listed among the risers.
            if movers.risers.iter().any(|r| r.label == m.label) {
                continue;
            }
            out.push_str(&format!(
                "| {} | {} | {:.4} |\n",
                m.label, m.day, m.baseline_index
            ));
        }
    }

    file.write_all(out.as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write debug file: {e}")))?;

    Ok(path)
}
