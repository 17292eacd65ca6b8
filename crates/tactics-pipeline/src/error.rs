//! Pipeline error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal problems detected before any game is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Stockfish executable not found: {0}")]
    EngineNotFound(PathBuf),

    #[error("Engine failed to start: {0}")]
    EngineStartup(String),

    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),

    #[error("No .pgn files found in: {0}")]
    NoInput(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while analyzing one game, or while writing the dataset.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Game timed out after {0:?}")]
    Timeout(Duration),

    #[error("No engine session available")]
    NoSession,

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the engine session that produced this error may be left in an
    /// unknown state (mid-search, dead process) and must be restarted.
    pub fn poisons_session(&self) -> bool {
        matches!(self, PipelineError::Stockfish(_) | PipelineError::Timeout(_))
    }
}
