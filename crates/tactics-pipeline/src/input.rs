//! PGN file discovery and game loading.

use std::fs;
use std::path::{Path, PathBuf};

use chess_core::game_data::{GameData, GameMetadata};
use chess_core::pgn::{extract_headers, parse_pgn, split_games, PgnError};
use glob::glob;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, PipelineError};

/// One unit of batch work, in input order.
#[derive(Debug, Clone)]
pub enum BatchItem {
    Game(GameData),
    /// A game whose PGN could not be replayed; reported as failed
    Unreadable { game_id: String, reason: String },
}

impl BatchItem {
    pub fn game_id(&self) -> String {
        match self {
            BatchItem::Game(game) => game.metadata.game_id(),
            BatchItem::Unreadable { game_id, .. } => game_id.clone(),
        }
    }
}

/// Expand input paths into a sorted list of `.pgn` files. Directories are
/// searched one level deep.
pub fn collect_pgn_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(ConfigError::InputNotFound(input.clone()));
        }

        let pattern = input.join("*.pgn");
        let pattern = pattern.to_string_lossy();
        let mut found: Vec<PathBuf> = glob(&pattern)
            .map_err(|e| ConfigError::Invalid(format!("bad input pattern {pattern}: {e}")))?
            .filter_map(Result::ok)
            .collect();
        found.sort();
        debug!(folder = %input.display(), count = found.len(), "Found PGN files");
        files.extend(found);
    }

    if files.is_empty() {
        let names: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
        return Err(ConfigError::NoInput(names.join(", ")));
    }
    Ok(files)
}

/// Parse every game in `text`. Games without moves are dropped.
pub fn load_games_from_str(text: &str) -> Vec<BatchItem> {
    let mut items = Vec::new();
    for chunk in split_games(text) {
        match parse_pgn(&chunk) {
            Ok(game) => items.push(BatchItem::Game(game)),
            Err(PgnError::NoMoves) => {}
            Err(e) => {
                let metadata = GameMetadata::from_headers(&extract_headers(&chunk));
                items.push(BatchItem::Unreadable {
                    game_id: metadata.game_id(),
                    reason: e.to_string(),
                });
            }
        }
    }
    items
}

/// Load every game in a PGN file. Bytes that are not UTF-8 (old Latin-1
/// collections) are replaced rather than rejecting the file.
pub fn load_games(path: &Path) -> Result<Vec<BatchItem>, PipelineError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    if let std::borrow::Cow::Owned(_) = text {
        warn!(file = %path.display(), "PGN file is not valid UTF-8, invalid bytes replaced");
    }
    let items = load_games_from_str(&text);
    info!(file = %path.display(), games = items.len(), "Loaded PGN file");
    Ok(items)
}
