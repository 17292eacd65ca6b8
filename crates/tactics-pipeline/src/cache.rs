//! Shared position evaluation cache, optionally persisted between runs.
//!
//! Entries map a normalized FEN to its White-POV centipawn value. The value
//! is a pure function of the position and the search limit, so concurrent
//! writers to the same key are harmless.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::oracle::SearchLimit;

/// On-disk layout. Entries computed under another search limit are dropped
/// on load.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    limit: SearchLimit,
    entries: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct EvalCache {
    entries: Arc<RwLock<HashMap<String, f64>>>,
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn cache_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

impl EvalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fen: &str) -> Option<f64> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&cache_key(fen)).copied()
    }

    pub fn insert(&self, fen: &str, cp: f64) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(cache_key(fen), cp);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a persisted cache. A missing file, an unreadable file, or one
    /// written under a different search limit all yield an empty cache.
    pub fn load(path: &Path, limit: SearchLimit) -> Self {
        if !path.exists() {
            return Self::new();
        }

        match read_cache_file(path) {
            Ok(file) if file.limit == limit => {
                info!(
                    path = %path.display(),
                    positions = file.entries.len(),
                    "Loaded evaluation cache"
                );
                Self {
                    entries: Arc::new(RwLock::new(file.entries)),
                }
            }
            Ok(file) => {
                info!(
                    path = %path.display(),
                    cached = %file.limit,
                    current = %limit,
                    "Evaluation cache built with a different search limit, starting fresh"
                );
                Self::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load evaluation cache");
                Self::new()
            }
        }
    }

    /// Write the cache so the next run with the same limit can reuse it.
    pub fn save(&self, path: &Path, limit: SearchLimit) -> Result<(), PipelineError> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let file = CacheFile { limit, entries };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &file).map_err(|e| PipelineError::Cache(e.to_string()))?;

        info!(path = %path.display(), positions = file.entries.len(), "Saved evaluation cache");
        Ok(())
    }
}

fn read_cache_file(path: &Path) -> Result<CacheFile, PipelineError> {
    let reader = BufReader::new(File::open(path)?);
    bincode::deserialize_from(reader).map_err(|e| PipelineError::Cache(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("eval_cache_{}_{name}.bin", std::process::id()))
    }

    #[test]
    fn test_key_ignores_move_counters() {
        let cache = EvalCache::new();
        cache.insert(START, 25.0);
        let later = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 4 3";
        assert_eq!(cache.get(later), Some(25.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = EvalCache::new();
        let other = cache.clone();
        other.insert(START, -10.0);
        assert_eq!(cache.get(START), Some(-10.0));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let cache = EvalCache::new();
        cache.insert(START, 18.0);
        cache.save(&path, SearchLimit::Depth(13)).unwrap();

        let loaded = EvalCache::load(&path, SearchLimit::Depth(13));
        assert_eq!(loaded.get(START), Some(18.0));

        let other_limit = EvalCache::load(&path, SearchLimit::Depth(20));
        assert!(other_limit.is_empty());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_or_corrupt_file() {
        assert!(EvalCache::load(&temp_path("missing"), SearchLimit::Depth(13)).is_empty());

        let path = temp_path("corrupt");
        std::fs::write(&path, b"not a cache").unwrap();
        assert!(EvalCache::load(&path, SearchLimit::Depth(13)).is_empty());
        std::fs::remove_file(&path).ok();
    }
}
