//! Read/write snapshot JSON files.
//!
//! A snapshot is the "portable" representation of a completed load:
//! row counts, dataset stats, and the three derived sets. It can be
//! re-viewed later (report or TUI) without touching the database.
//!
//! The schema is defined by `SnapshotFile`.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{DatasetStats, DerivedSets};
use crate::error::AppError;

/// Snapshot file schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub tool: String,
    pub rows_read: usize,
    pub rows_used: usize,
    pub stats: DatasetStats,
    pub sets: DerivedSets,
}

/// Write a snapshot JSON file.
pub fn write_snapshot(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create snapshot '{}': {e}", path.display()),
        )
    })?;

    let snapshot = SnapshotFile {
        tool: "pw".to_string(),
        rows_read: run.rows_read,
        rows_used: run.rows_used,
        stats: run.stats.clone(),
        sets: run.sets.clone(),
    };

    serde_json::to_writer_pretty(file, &snapshot)
        .map_err(|e| AppError::new(2, format!("Failed to write snapshot JSON: {e}")))?;

    Ok(())
}

/// Read a snapshot JSON file back into a run output.
///
/// Row errors are not persisted; a reloaded run reports none.
pub fn read_snapshot(path: &Path) -> Result<RunOutput, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open snapshot '{}': {e}", path.display()),
        )
    })?;
    let snapshot: SnapshotFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid snapshot JSON: {e}")))?;

    Ok(RunOutput {
        sets: snapshot.sets,
        stats: snapshot.stats,
        rows_read: snapshot.rows_read,
        rows_used: snapshot.rows_used,
        row_errors: Vec::new(),
    })
}
