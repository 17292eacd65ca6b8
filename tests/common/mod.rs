#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tactics_pipeline::error::PipelineError;
use tactics_pipeline::oracle::{Oracle, SearchLimit};
use tactics_pipeline::score::RawScore;

pub const START_BOARD: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

/// Oracle driven by a table of White-POV centipawns keyed by the board field
/// of the FEN. Unknown positions score 0.
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    pub scores: Arc<HashMap<String, i32>>,
    /// Board that makes every query fail like a crashed engine
    pub fail_on: Option<String>,
    pub calls: Arc<AtomicUsize>,
    pub restarts: Arc<AtomicUsize>,
}

impl ScriptedOracle {
    pub fn with_scores(scores: &[(&str, i32)]) -> Self {
        Self {
            scores: Arc::new(scores.iter().map(|(b, cp)| (b.to_string(), *cp)).collect()),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, board: &str) -> Self {
        self.fail_on = Some(board.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Oracle for ScriptedOracle {
    async fn evaluate(
        &mut self,
        fen: &str,
        _limit: SearchLimit,
    ) -> Result<Option<RawScore>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let board = fen.split_whitespace().next().unwrap_or_default();
        if self.fail_on.as_deref() == Some(board) {
            return Err(PipelineError::Stockfish("engine crashed".into()));
        }
        Ok(Some(RawScore::Cp(self.scores.get(board).copied().unwrap_or(0))))
    }

    async fn restart(&mut self) -> Result<(), PipelineError> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn quit(&mut self) {}
}

/// Build a single-game PGN with the given players and movetext.
pub fn pgn(white: &str, black: &str, movetext: &str) -> String {
    format!(
        "[Event \"Test\"]\n[Date \"2024.01.01\"]\n[Round \"1\"]\n[White \"{white}\"]\n[Black \"{black}\"]\n[Result \"*\"]\n[ECO \"C20\"]\n\n{movetext} *\n\n"
    )
}

/// Unique temp file path to avoid collisions between parallel tests.
pub fn temp_path(name: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tactics_{}_{}_{name}", std::process::id(), ts))
}
