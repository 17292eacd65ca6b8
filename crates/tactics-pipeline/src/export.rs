//! Dataset export to CSV and JSON.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::dataset::MoveFeatureRecord;
use crate::error::PipelineError;

/// CSV header, in column order.
pub const COLUMNS: [&str; 28] = [
    "game_id",
    "white",
    "black",
    "result",
    "eco",
    "move_number",
    "ply_index",
    "color_to_move",
    "move_san",
    "move_uci",
    "fen_before",
    "fen_after",
    "eval_before",
    "eval_after",
    "eval_diff",
    "eval_diff_abs",
    "material_before",
    "material_after",
    "material_diff",
    "is_capture",
    "is_check",
    "is_mate",
    "motif",
    "is_sacrifice",
    "is_initiative",
    "phase",
    "imbalance_score",
    "comment",
];

fn create_parent(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_csv(path: &Path, rows: &[MoveFeatureRecord]) -> Result<(), PipelineError> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

pub fn write_json(path: &Path, rows: &[MoveFeatureRecord]) -> Result<(), PipelineError> {
    create_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "JSON written");
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<MoveFeatureRecord>, PipelineError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn read_json(path: &Path) -> Result<Vec<MoveFeatureRecord>, PipelineError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
