//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::process::Stdio;

use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::PipelineError;
use crate::oracle::{Oracle, SearchLimit};
use crate::score::RawScore;

/// A running Stockfish process
pub struct StockfishEngine {
    config: EngineConfig,
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(config: &EngineConfig) -> Result<Self, PipelineError> {
        let mut process = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PipelineError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| PipelineError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| PipelineError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            config: config.clone(),
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine
            .send(&format!("setoption name Threads value {}", config.threads))
            .await?;
        engine
            .send(&format!("setoption name Hash value {}", config.hash_mb))
            .await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        debug!(path = %config.path.display(), "Stockfish ready");
        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), PipelineError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| PipelineError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| PipelineError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line; a closed pipe means the process died.
    async fn read_line(&mut self, line: &mut String) -> Result<(), PipelineError> {
        line.clear();
        let n = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| PipelineError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if n == 0 {
            return Err(PipelineError::Stockfish("Stockfish closed its output".into()));
        }
        debug!(line = line.trim(), "SF >");
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), PipelineError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Search `fen` and return the last score reported before `bestmove`,
    /// relative to the side to move.
    async fn search(
        &mut self,
        fen: &str,
        limit: SearchLimit,
    ) -> Result<Option<RawScore>, PipelineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&limit.go_command()).await?;

        let mut score = None;
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") {
                if let Some(s) = parse_score(trimmed) {
                    score = Some(s);
                }
            } else if trimmed.starts_with("bestmove") {
                break;
            }
        }

        Ok(score)
    }

    /// Send quit command and wait for process to exit
    pub async fn shutdown(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Oracle for StockfishEngine {
    async fn evaluate(
        &mut self,
        fen: &str,
        limit: SearchLimit,
    ) -> Result<Option<RawScore>, PipelineError> {
        let side = side_to_move(fen);
        let score = self.search(fen, limit).await?;
        if score.is_none() {
            warn!(fen, "Stockfish reported no score");
        }
        Ok(score.map(|s| s.white_pov(side)))
    }

    async fn restart(&mut self) -> Result<(), PipelineError> {
        info!(path = %self.config.path.display(), "Restarting Stockfish");
        let _ = self.process.start_kill();
        let _ = self.process.wait().await;
        let config = self.config.clone();
        *self = Self::new(&config).await?;
        Ok(())
    }

    async fn quit(&mut self) {
        self.shutdown().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Side to move from the second FEN field; anything but `b` is White.
fn side_to_move(fen: &str) -> Color {
    match fen.split_whitespace().nth(1) {
        Some("b") => Color::Black,
        _ => Color::White,
    }
}

/// Parse the score from an info line. Bound-only scores
/// (`lowerbound`/`upperbound`) are still taken as reported.
fn parse_score(line: &str) -> Option<RawScore> {
    if !line.contains(" score ") {
        return None;
    }
    parse_cp(line)
        .map(RawScore::Cp)
        .or_else(|| parse_mate(line).map(RawScore::Mate))
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    token_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    token_after(line, "mate")
}

fn token_after(line: &str, key: &str) -> Option<i32> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next()?.parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
        assert_eq!(parse_score(line), Some(RawScore::Cp(35)));
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate 3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(3));
        assert_eq!(parse_score(line), Some(RawScore::Mate(3)));

        let line = "info depth 1 seldepth 1 score mate -2 pv h7h8";
        assert_eq!(parse_score(line), Some(RawScore::Mate(-2)));
    }

    #[test]
    fn test_parse_score_ignores_lines_without_score() {
        assert_eq!(parse_score("info string NNUE evaluation using nn.nnue"), None);
        assert_eq!(parse_score("info depth 5 currmove e2e4 currmovenumber 1"), None);
        assert_eq!(parse_score("info depth 5 score cp abc"), None);
    }

    #[test]
    fn test_side_to_move() {
        assert_eq!(
            side_to_move("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"),
            Color::Black
        );
        assert_eq!(
            side_to_move("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Color::White
        );
    }
}
