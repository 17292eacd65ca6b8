//! Tactical dataset builder
//!
//! Replays PGN collections through Stockfish and writes one feature row per
//! move to CSV (and optionally JSON).

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use tactics_pipeline::batch::{run_batch, BatchReport, BatchSettings, SessionPool};
use tactics_pipeline::cache::EvalCache;
use tactics_pipeline::config::{PipelineConfig, SacrificeRule};
use tactics_pipeline::error::ConfigError;
use tactics_pipeline::export::{write_csv, write_json};
use tactics_pipeline::input::{collect_pgn_files, load_games};
use tactics_pipeline::stockfish::StockfishEngine;
use tactics_pipeline::tactics::TacticalAnalyzer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build a per-move tactical feature dataset from PGN files")]
struct Cli {
    /// Folder of .pgn files, or a single .pgn file (repeatable)
    #[arg(long = "pgn-folder", required = true)]
    pgn_folders: Vec<PathBuf>,

    /// Stockfish executable (default: $STOCKFISH_PATH or /usr/local/bin/stockfish)
    #[arg(long)]
    engine_path: Option<PathBuf>,

    /// Search depth per position (default: $ENGINE_DEPTH or 13)
    #[arg(long)]
    depth: Option<u32>,

    /// Search time per position in milliseconds; replaces depth
    #[arg(long)]
    movetime: Option<u64>,

    /// Stockfish threads per session
    #[arg(long)]
    threads: Option<u32>,

    /// Stockfish hash size in MB
    #[arg(long)]
    hash: Option<u32>,

    /// CSV output path; JSON goes next to it
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Skip the JSON export
    #[arg(long)]
    no_json: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Minimum material given up for a sacrifice (centipawns)
    #[arg(long)]
    sacrifice_threshold: Option<f64>,

    /// Evaluation drop still accepted for a sacrifice (centipawns)
    #[arg(long)]
    sacrifice_tolerance: Option<f64>,

    /// Evaluation swing that counts as initiative (centipawns)
    #[arg(long)]
    initiative_threshold: Option<f64>,

    /// Last move number of the opening
    #[arg(long)]
    opening_moves: Option<u32>,

    /// Last move number of the middlegame
    #[arg(long)]
    endgame_moves: Option<u32>,

    /// Use the raw-sign sacrifice test instead of the normalized one
    #[arg(long)]
    raw_sign_sacrifice: bool,

    /// Evaluate every position even if seen before
    #[arg(long)]
    no_cache: bool,

    /// Persist the evaluation cache to this file
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Games analyzed in parallel, one engine each (0 = all CPUs)
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Give up on a game after this many seconds
    #[arg(long)]
    game_timeout: Option<u64>,

    /// Shallow, time-capped search for test runs
    #[arg(long)]
    quick: bool,

    /// Verbose logging, including UCI traffic
    #[arg(long)]
    debug: bool,

    /// Also append the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env();
        if self.quick {
            config = config.quick();
        }

        if let Some(path) = self.engine_path {
            config.engine.path = path;
        }
        if let Some(depth) = self.depth {
            config.engine.depth = depth;
        }
        if let Some(ms) = self.movetime {
            config.engine.movetime_ms = Some(ms);
        }
        if let Some(threads) = self.threads {
            config.engine.threads = threads;
        }
        if let Some(hash) = self.hash {
            config.engine.hash_mb = hash;
        }

        let analysis = &mut config.analysis;
        if let Some(v) = self.sacrifice_threshold {
            analysis.sacrifice_material_threshold = v;
        }
        if let Some(v) = self.sacrifice_tolerance {
            analysis.sacrifice_eval_tolerance = v;
        }
        if let Some(v) = self.initiative_threshold {
            analysis.initiative_eval_threshold = v;
        }
        if let Some(v) = self.opening_moves {
            analysis.opening_moves = v;
        }
        if let Some(v) = self.endgame_moves {
            analysis.endgame_moves = v;
        }
        if self.raw_sign_sacrifice {
            analysis.sacrifice_rule = SacrificeRule::RawSign;
        }

        if let Some(output) = &self.output {
            config.output.set_csv_path(output);
        }
        config.output.enable_json = !self.no_json;
        config.output.enable_progress = !self.no_progress;

        config.enable_cache = !self.no_cache;
        config.cache_path = self.cache_file;
        config.concurrency = if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        };
        config.game_timeout = self.game_timeout.map(Duration::from_secs);

        config
    }
}

fn progress_bar(enabled: bool, len: u64) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games ({per_sec}) {msg}",
    ) {
        bar.set_style(style);
    }
    bar
}

fn print_summary(report: &BatchReport) {
    let stats = &report.stats;
    println!("{}", "=".repeat(60));
    println!("Games processed:    {}", stats.games_processed);
    println!("Games skipped:      {}", stats.games_failed);
    println!("Moves processed:    {}", stats.moves_processed);
    println!("Sacrifices found:   {}", stats.sacrifices);
    println!("Initiatives found:  {}", stats.initiatives);
    println!("Elapsed:            {:.1}s", stats.elapsed_secs);
    println!("Moves per second:   {:.2}", stats.moves_per_second());
    println!("{}", "=".repeat(60));
}

/// Returns whether any rows were produced.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let inputs = cli.pgn_folders.clone();
    let config = cli.into_config();
    config.validate()?;

    let files = collect_pgn_files(&inputs)?;
    let mut items = Vec::new();
    for file in &files {
        match load_games(file) {
            Ok(games) => items.extend(games),
            Err(e) => error!(file = %file.display(), error = %e, "Cannot read PGN file, skipping"),
        }
    }
    info!(files = files.len(), games = items.len(), "Input loaded");

    let limit = config.engine.limit();
    let cache = match (&config.cache_path, config.enable_cache) {
        (Some(path), true) => Some(EvalCache::load(path, limit)),
        (None, true) => Some(EvalCache::new()),
        (_, false) => None,
    };

    let sessions = config.concurrency.min(items.len().max(1));
    let mut engines = Vec::with_capacity(sessions);
    for engine_id in 0..sessions {
        let engine = StockfishEngine::new(&config.engine)
            .await
            .map_err(|e| ConfigError::EngineStartup(e.to_string()))?;
        info!(engine_id, "Stockfish engine ready");
        engines.push(engine);
    }
    let pool = Arc::new(SessionPool::new(engines));

    let settings = BatchSettings {
        analyzer: Arc::new(TacticalAnalyzer::new(config.analysis.clone())),
        limit,
        cache: cache.clone(),
        game_timeout: config.game_timeout,
    };
    let progress = progress_bar(config.output.enable_progress, items.len() as u64);
    let report = run_batch(pool.clone(), items, settings, progress).await;
    pool.shutdown().await;

    if let (Some(cache), Some(path)) = (&cache, &config.cache_path) {
        if let Err(e) = cache.save(path, limit) {
            error!(path = %path.display(), error = %e, "Failed to save evaluation cache");
        }
    }

    let rows = report.rows();
    if rows.is_empty() {
        error!("No rows produced, nothing written");
        print_summary(&report);
        return Ok(false);
    }

    write_csv(&config.output.csv_path, &rows)?;
    if config.output.enable_json {
        write_json(&config.output.json_path, &rows)?;
    }
    print_summary(&report);
    println!("Dataset: {}", config.output.csv_path.display());
    Ok(true)
}

/// Console logging, plus a plain-text copy in `log_file` when given.
fn init_tracing(debug: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.debug, cli.log_file.as_deref()) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_flag() {
        let cli = Cli::try_parse_from([
            "tactics-pipeline",
            "--pgn-folder",
            "games",
            "--log-file",
            "run.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));

        let cli = Cli::try_parse_from(["tactics-pipeline", "--pgn-folder", "games"]).unwrap();
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn test_unopenable_log_file_is_an_error() {
        let path = Path::new("/definitely/not/a/folder/run.log");
        let err = init_tracing(false, Some(path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to open log file"));
    }
}
