//! Bounded worker pool over games.
//!
//! Each game runs as its own task and owns one engine session for its whole
//! duration. Outcomes are merged back in input order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chess_core::game_data::GameData;
use indicatif::ProgressBar;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::analyzer::analyze_game;
use crate::cache::EvalCache;
use crate::dataset::{build_rows, MoveFeatureRecord};
use crate::error::PipelineError;
use crate::input::BatchItem;
use crate::oracle::{Oracle, SearchLimit};
use crate::tactics::{Motif, TacticalAnalyzer};

/// Idle engine sessions plus one permit per live session.
pub struct SessionPool<O> {
    idle: Mutex<Vec<O>>,
    permits: Arc<Semaphore>,
    live: AtomicUsize,
}

impl<O: Oracle> SessionPool<O> {
    pub fn new(sessions: Vec<O>) -> Self {
        let count = sessions.len();
        Self {
            idle: Mutex::new(sessions),
            permits: Arc::new(Semaphore::new(count)),
            live: AtomicUsize::new(count),
        }
    }

    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn take(&self) -> Option<O> {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }

    fn put_back(&self, session: O) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session);
    }

    /// A session could not be recovered. Once none are left, waiting games
    /// fail instead of blocking forever.
    fn session_lost(&self) {
        if self.live.fetch_sub(1, Ordering::SeqCst) == 1 {
            error!("No engine sessions left");
            self.permits.close();
        }
    }

    /// Quit every idle session.
    pub async fn shutdown(&self) {
        let sessions: Vec<O> = std::mem::take(
            &mut *self.idle.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for mut session in sessions {
            session.quit().await;
        }
    }
}

/// Result of one game.
#[derive(Debug, Clone)]
pub enum GameOutcome {
    Analyzed {
        game_id: String,
        rows: Vec<MoveFeatureRecord>,
    },
    Failed {
        game_id: String,
        reason: String,
    },
}

impl GameOutcome {
    pub fn game_id(&self) -> &str {
        match self {
            GameOutcome::Analyzed { game_id, .. } | GameOutcome::Failed { game_id, .. } => game_id,
        }
    }
}

/// Settings shared by every game in a batch.
#[derive(Clone)]
pub struct BatchSettings {
    pub analyzer: Arc<TacticalAnalyzer>,
    pub limit: SearchLimit,
    pub cache: Option<EvalCache>,
    pub game_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub games_processed: usize,
    pub games_failed: usize,
    pub moves_processed: usize,
    pub sacrifices: usize,
    pub initiatives: usize,
    pub elapsed_secs: f64,
}

impl RunStats {
    pub fn moves_per_second(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.moves_processed as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }

    fn record(&mut self, outcome: &GameOutcome) {
        match outcome {
            GameOutcome::Analyzed { rows, .. } => {
                self.games_processed += 1;
                self.moves_processed += rows.len();
                self.sacrifices += rows.iter().filter(|r| r.is_sacrifice).count();
                self.initiatives += rows.iter().filter(|r| r.is_initiative).count();
            }
            GameOutcome::Failed { .. } => self.games_failed += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<GameOutcome>,
    pub stats: RunStats,
}

impl BatchReport {
    /// All rows, games in input order.
    pub fn rows(&self) -> Vec<MoveFeatureRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                GameOutcome::Analyzed { rows, .. } => Some(rows.iter().cloned()),
                GameOutcome::Failed { .. } => None,
            })
            .flatten()
            .collect()
    }

    pub fn motif_count(&self, motif: Motif) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                GameOutcome::Analyzed { rows, .. } => Some(rows),
                GameOutcome::Failed { .. } => None,
            })
            .flatten()
            .filter(|r| r.motif == motif)
            .count()
    }
}

async fn analyze_with_session<O: Oracle>(
    session: &mut O,
    game: &GameData,
    settings: &BatchSettings,
) -> Result<Vec<MoveFeatureRecord>, PipelineError> {
    let analysis = analyze_game(session, settings.cache.as_ref(), settings.limit, game);
    let records = match settings.game_timeout {
        Some(limit) => tokio::time::timeout(limit, analysis)
            .await
            .map_err(|_| PipelineError::Timeout(limit))??,
        None => analysis.await?,
    };
    Ok(build_rows(&game.metadata, &records, &settings.analyzer))
}

/// Analyze one game on a pooled session, restarting the session if the game
/// left it in an unknown state.
async fn run_game<O: Oracle + 'static>(
    pool: Arc<SessionPool<O>>,
    game: GameData,
    settings: BatchSettings,
) -> Result<Vec<MoveFeatureRecord>, PipelineError> {
    let permit = pool
        .permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| PipelineError::NoSession)?;
    let Some(mut session) = pool.take() else {
        permit.forget();
        return Err(PipelineError::NoSession);
    };

    let result = analyze_with_session(&mut session, &game, &settings).await;

    let poisoned = matches!(&result, Err(e) if e.poisons_session());
    if poisoned {
        if let Err(restart_err) = session.restart().await {
            error!(error = %restart_err, "Engine restart failed, dropping session");
            drop(session);
            permit.forget();
            pool.session_lost();
            return result;
        }
    }

    pool.put_back(session);
    drop(permit);
    result
}

/// Run every item through the pool and merge outcomes in input order.
/// Failures are logged here, once per game.
pub async fn run_batch<O: Oracle + 'static>(
    pool: Arc<SessionPool<O>>,
    items: Vec<BatchItem>,
    settings: BatchSettings,
    progress: ProgressBar,
) -> BatchReport {
    let started = Instant::now();
    info!(
        games = items.len(),
        sessions = pool.live_sessions(),
        limit = %settings.limit,
        "Starting batch"
    );

    let mut pending = Vec::with_capacity(items.len());
    for item in items {
        let game_id = item.game_id();
        match item {
            BatchItem::Game(game) => {
                let pool = pool.clone();
                let settings = settings.clone();
                let progress = progress.clone();
                let handle = tokio::spawn(async move {
                    let result = run_game(pool, game, settings).await;
                    progress.inc(1);
                    result
                });
                pending.push((game_id, Ok(handle)));
            }
            BatchItem::Unreadable { reason, .. } => {
                progress.inc(1);
                pending.push((game_id, Err(reason)));
            }
        }
    }

    let mut report = BatchReport::default();
    for (game_id, task) in pending {
        let outcome = match task {
            Ok(handle) => match handle.await {
                Ok(Ok(rows)) => {
                    info!(game_id = %game_id, moves = rows.len(), "Game analyzed");
                    GameOutcome::Analyzed { game_id, rows }
                }
                Ok(Err(e)) => GameOutcome::Failed {
                    game_id,
                    reason: e.to_string(),
                },
                Err(join_err) => GameOutcome::Failed {
                    game_id,
                    reason: PipelineError::Worker(join_err.to_string()).to_string(),
                },
            },
            Err(reason) => GameOutcome::Failed { game_id, reason },
        };

        if let GameOutcome::Failed { game_id, reason } = &outcome {
            warn!(game_id = %game_id, reason = %reason, "Game skipped");
        }
        report.stats.record(&outcome);
        report.outcomes.push(outcome);
    }

    progress.finish_and_clear();
    report.stats.elapsed_secs = started.elapsed().as_secs_f64();
    report
}
