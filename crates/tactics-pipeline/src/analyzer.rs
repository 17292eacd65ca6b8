//! Per-game analysis: replay the mainline and evaluate every position.

use chess_core::game_data::GameData;
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};
use tracing::{debug, warn};

use crate::cache::EvalCache;
use crate::error::PipelineError;
use crate::material::{self, MaterialSnapshot};
use crate::oracle::{Oracle, SearchLimit};
use crate::score::to_centipawns;

/// Everything measured about one half-move before classification.
/// Evaluations and material are White-positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMoveRecord {
    /// 1-based half-move index
    pub ply_index: u32,
    pub move_number: u32,
    pub move_san: String,
    pub move_uci: String,
    pub fen_before: String,
    pub fen_after: String,
    pub eval_before: f64,
    pub eval_after: f64,
    pub material_before: MaterialSnapshot,
    pub material_after: MaterialSnapshot,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_mate: bool,
}

impl RawMoveRecord {
    /// Odd plies are White's.
    pub fn mover(&self) -> Color {
        mover_for_ply(self.ply_index)
    }
}

pub fn mover_for_ply(ply_index: u32) -> Color {
    if ply_index % 2 == 1 {
        Color::White
    } else {
        Color::Black
    }
}

/// Full move number for a 1-based ply (`ceil(ply / 2)`).
pub fn move_number(ply_index: u32) -> u32 {
    ply_index.div_ceil(2)
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Evaluate one position, consulting the cache first. Missing engine scores
/// count as neutral and are not cached.
pub async fn evaluate_position<O: Oracle>(
    oracle: &mut O,
    cache: Option<&EvalCache>,
    fen: &str,
    limit: SearchLimit,
) -> Result<f64, PipelineError> {
    if let Some(cp) = cache.and_then(|c| c.get(fen)) {
        return Ok(cp);
    }

    let score = oracle.evaluate(fen, limit).await?;
    let cp = to_centipawns(score);
    if let (Some(cache), Some(_)) = (cache, score) {
        cache.insert(fen, cp);
    }
    Ok(cp)
}

/// SAN for a move, or its UCI form when it cannot be rendered.
fn notation(pos: &Chess, mv: &Move, uci: &str, legal: bool) -> String {
    if legal {
        San::from_move(pos, mv.clone()).to_string()
    } else {
        uci.to_string()
    }
}

/// Walk the game from the standard start position and produce one record
/// per half-move, in order.
pub async fn analyze_game<O: Oracle>(
    oracle: &mut O,
    cache: Option<&EvalCache>,
    limit: SearchLimit,
    game: &GameData,
) -> Result<Vec<RawMoveRecord>, PipelineError> {
    let mut pos = Chess::default();
    let mut records = Vec::with_capacity(game.moves.len());

    for (i, mv) in game.moves.iter().enumerate() {
        let ply_index = i as u32 + 1;

        let fen_before = fen_of(&pos);
        let eval_before = evaluate_position(oracle, cache, &fen_before, limit).await?;
        let material_before = material::evaluate(pos.board());

        let move_uci = mv.to_uci(CastlingMode::Standard).to_string();
        let legal = pos.legal_moves().contains(mv);
        if !legal {
            warn!(ply = ply_index, uci = %move_uci, "Move not legal here, using UCI and playing it anyway");
        }
        let mut move_san = notation(&pos, mv, &move_uci, legal);
        let is_capture = mv.is_capture();

        pos.play_unchecked(mv.clone());

        let fen_after = fen_of(&pos);
        let eval_after = evaluate_position(oracle, cache, &fen_after, limit).await?;
        let material_after = material::evaluate(pos.board());

        let is_mate = pos.is_checkmate();
        let is_check = pos.is_check();
        if is_mate {
            move_san.push('#');
        } else if is_check {
            move_san.push('+');
        }

        debug!(ply = ply_index, san = %move_san, eval_before, eval_after, "Move analyzed");

        records.push(RawMoveRecord {
            ply_index,
            move_number: move_number(ply_index),
            move_san,
            move_uci,
            fen_before,
            fen_after,
            eval_before,
            eval_after,
            material_before,
            material_after,
            is_capture,
            is_check,
            is_mate,
        });
    }

    Ok(records)
}
