//! Dataset rows: raw per-move measurements joined with classification and
//! game metadata.

use chess_core::game_data::GameMetadata;
use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::analyzer::RawMoveRecord;
use crate::phase::Phase;
use crate::score::format_eval;
use crate::tactics::{Motif, TacticalAnalyzer};

/// One dataset row. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveFeatureRecord {
    pub game_id: String,
    pub white: String,
    pub black: String,
    pub result: String,
    pub eco: String,
    pub move_number: u32,
    pub ply_index: u32,
    /// Side that played the move: "white" or "black"
    pub color_to_move: String,
    pub move_san: String,
    pub move_uci: String,
    pub fen_before: String,
    pub fen_after: String,
    pub eval_before: f64,
    pub eval_after: f64,
    pub eval_diff: f64,
    pub eval_diff_abs: f64,
    pub material_before: i32,
    pub material_after: i32,
    pub material_diff: i32,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_mate: bool,
    pub motif: Motif,
    pub is_sacrifice: bool,
    pub is_initiative: bool,
    pub phase: Phase,
    pub imbalance_score: f64,
    pub comment: String,
}

fn color_label(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Short display sentence for a classified move.
fn build_comment(
    motif: Motif,
    material_diff: i32,
    eval_before: f64,
    eval_after: f64,
    eval_diff_abs: f64,
    is_mate: bool,
) -> String {
    let mut comment = match motif {
        Motif::SacrificeCheck | Motif::Sacrifice => {
            let label = if motif == Motif::SacrificeCheck {
                "Sacrifice with check"
            } else {
                "Sacrifice"
            };
            format!(
                "{label}: gives up {:.1} pawns, eval {} -> {}",
                f64::from(material_diff.abs()) / 100.0,
                format_eval(eval_before),
                format_eval(eval_after)
            )
        }
        Motif::TacticalBlow => format!(
            "Tactical blow: capture swings eval by {:.2} pawns",
            eval_diff_abs / 100.0
        ),
        Motif::Initiative => format!(
            "Initiative: eval swing of {:.2} pawns",
            eval_diff_abs / 100.0
        ),
        Motif::Quiet => "Quiet move".to_string(),
    };
    if is_mate {
        comment.push_str(" (checkmate)");
    }
    comment
}

/// Classify one raw record.
pub fn build_row(
    metadata: &GameMetadata,
    game_id: &str,
    record: &RawMoveRecord,
    analyzer: &TacticalAnalyzer,
) -> MoveFeatureRecord {
    let eval_diff = record.eval_after - record.eval_before;
    let eval_diff_abs = eval_diff.abs();
    let material_before = record.material_before.balance;
    let material_after = record.material_after.balance;
    let material_diff = material_after - material_before;
    let mover = record.mover();

    let is_sacrifice = analyzer.detect_sacrifice(
        f64::from(material_diff),
        record.eval_before,
        record.eval_after,
        mover,
    );
    let is_initiative = analyzer.is_initiative(eval_diff_abs);
    let motif = analyzer.classify_motif(
        is_sacrifice,
        is_initiative,
        record.is_capture,
        record.is_check,
    );
    let imbalance_score =
        analyzer.imbalance(record.eval_after, f64::from(material_diff), eval_diff_abs);

    MoveFeatureRecord {
        game_id: game_id.to_string(),
        white: metadata.white.clone(),
        black: metadata.black.clone(),
        result: metadata.result.clone(),
        eco: metadata.eco.clone(),
        move_number: record.move_number,
        ply_index: record.ply_index,
        color_to_move: color_label(mover).to_string(),
        move_san: record.move_san.clone(),
        move_uci: record.move_uci.clone(),
        fen_before: record.fen_before.clone(),
        fen_after: record.fen_after.clone(),
        eval_before: record.eval_before,
        eval_after: record.eval_after,
        eval_diff,
        eval_diff_abs,
        material_before,
        material_after,
        material_diff,
        is_capture: record.is_capture,
        is_check: record.is_check,
        is_mate: record.is_mate,
        motif,
        is_sacrifice,
        is_initiative,
        phase: analyzer.phase(record.move_number),
        imbalance_score,
        comment: build_comment(
            motif,
            material_diff,
            record.eval_before,
            record.eval_after,
            eval_diff_abs,
            record.is_mate,
        ),
    }
}

/// Build the rows for one game. Pure: the same input always yields the same
/// rows.
pub fn build_rows(
    metadata: &GameMetadata,
    records: &[RawMoveRecord],
    analyzer: &TacticalAnalyzer,
) -> Vec<MoveFeatureRecord> {
    let game_id = metadata.game_id();
    records
        .iter()
        .map(|record| build_row(metadata, &game_id, record, analyzer))
        .collect()
}
