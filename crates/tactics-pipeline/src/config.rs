//! Pipeline configuration from environment variables and CLI overrides

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::oracle::SearchLimit;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to Stockfish binary
    pub path: PathBuf,

    /// Search depth per position
    pub depth: u32,

    /// Fixed time per position; replaces `depth` when set
    pub movetime_ms: Option<u64>,

    pub threads: u32,

    pub hash_mb: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/usr/local/bin/stockfish"),
            depth: 13,
            movetime_ms: None,
            threads: 1,
            hash_mb: 128,
        }
    }
}

impl EngineConfig {
    pub fn limit(&self) -> SearchLimit {
        match self.movetime_ms {
            Some(ms) => SearchLimit::MoveTime(ms),
            None => SearchLimit::Depth(self.depth),
        }
    }
}

/// Which sacrifice test the classifier applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SacrificeRule {
    /// Both evaluations normalized to the mover before comparing
    #[default]
    Normalized,
    /// Older variant: signed material diff compared strictly against the threshold
    RawSign,
}

/// Thresholds and weights for tactical classification (centipawns).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub sacrifice_material_threshold: f64,
    pub sacrifice_eval_tolerance: f64,
    pub initiative_eval_threshold: f64,
    pub sacrifice_rule: SacrificeRule,

    // Imbalance score weights
    pub eval_weight: f64,
    pub material_weight: f64,
    pub eval_diff_weight: f64,

    // Phase boundaries (move numbers)
    pub opening_moves: u32,
    pub endgame_moves: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sacrifice_material_threshold: 150.0,
            sacrifice_eval_tolerance: 50.0,
            initiative_eval_threshold: 80.0,
            sacrifice_rule: SacrificeRule::Normalized,
            eval_weight: 0.6,
            material_weight: 0.1,
            eval_diff_weight: 0.3,
            opening_moves: 15,
            endgame_moves: 40,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("sacrifice material threshold", self.sacrifice_material_threshold),
            ("sacrifice eval tolerance", self.sacrifice_eval_tolerance),
            ("initiative eval threshold", self.initiative_eval_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }

        let weights = [
            ("eval weight", self.eval_weight),
            ("material weight", self.material_weight),
            ("eval diff weight", self.eval_diff_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.opening_moves > self.endgame_moves {
            return Err(ConfigError::Invalid(format!(
                "opening boundary ({}) is past endgame boundary ({})",
                self.opening_moves, self.endgame_moves
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct OutputConfig {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub enable_json: bool,
    pub enable_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("dataset_tactics.csv"),
            json_path: PathBuf::from("dataset_tactics.json"),
            enable_json: true,
            enable_progress: true,
        }
    }
}

impl OutputConfig {
    /// Point the CSV at `path`; the JSON file follows it with a `.json` extension.
    pub fn set_csv_path(&mut self, path: &Path) {
        self.csv_path = path.to_path_buf();
        self.json_path = path.with_extension("json");
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub engine: EngineConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,

    /// Reuse evaluations of repeated positions
    pub enable_cache: bool,

    /// Persist the evaluation cache between runs
    pub cache_path: Option<PathBuf>,

    /// Games analyzed in parallel, one engine process each
    pub concurrency: usize,

    /// Abandon a game that takes longer than this
    pub game_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            analysis: AnalysisConfig::default(),
            output: OutputConfig::default(),
            enable_cache: true,
            cache_path: None,
            concurrency: 1,
            game_timeout: None,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("STOCKFISH_PATH") {
            config.engine.path = PathBuf::from(path);
        }
        if let Some(depth) = parse_env("ENGINE_DEPTH") {
            config.engine.depth = depth;
        }
        if let Some(threads) = parse_env("ENGINE_THREADS") {
            config.engine.threads = threads;
        }
        if let Some(hash_mb) = parse_env("ENGINE_HASH_MB") {
            config.engine.hash_mb = hash_mb;
        }

        info!(stockfish_path = %config.engine.path.display(), "Config loaded from environment");
        config
    }

    /// Shallow, time-capped search for quick test runs.
    pub fn quick(mut self) -> Self {
        self.engine.depth = 10;
        self.engine.movetime_ms = Some(500);
        self
    }

    /// Fail-fast checks run before any game is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.engine.path.is_file() {
            return Err(ConfigError::EngineNotFound(self.engine.path.clone()));
        }
        self.validate_settings()
    }

    /// Everything except the engine path, which depends on the host.
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;

        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.engine.depth == 0 && self.engine.movetime_ms.is_none() {
            return Err(ConfigError::Invalid("search depth must be at least 1".into()));
        }
        if self.engine.movetime_ms == Some(0) {
            return Err(ConfigError::Invalid("movetime must be at least 1 ms".into()));
        }
        if self.engine.threads == 0 {
            return Err(ConfigError::Invalid("engine threads must be at least 1".into()));
        }
        if self.game_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid("game timeout must be positive".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
