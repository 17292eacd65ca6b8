//! Position evaluation seam between the analysis driver and the engine.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::score::RawScore;

/// How long the engine searches each position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLimit {
    Depth(u32),
    /// Milliseconds
    MoveTime(u64),
}

impl SearchLimit {
    /// UCI `go` command for this limit
    pub fn go_command(self) -> String {
        match self {
            SearchLimit::Depth(depth) => format!("go depth {depth}"),
            SearchLimit::MoveTime(ms) => format!("go movetime {ms}"),
        }
    }
}

impl fmt::Display for SearchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchLimit::Depth(depth) => write!(f, "depth {depth}"),
            SearchLimit::MoveTime(ms) => write!(f, "movetime {ms}ms"),
        }
    }
}

/// A stateful evaluation session. One query in flight at a time, enforced by
/// `&mut self`.
pub trait Oracle: Send {
    /// Evaluate `fen`. Scores are from White's point of view; `Ok(None)` means
    /// the engine finished without reporting one.
    fn evaluate(
        &mut self,
        fen: &str,
        limit: SearchLimit,
    ) -> impl Future<Output = Result<Option<RawScore>, PipelineError>> + Send;

    /// Bring the session back to a clean state after a failure or an
    /// abandoned query.
    fn restart(&mut self) -> impl Future<Output = Result<(), PipelineError>> + Send;

    /// Shut down the session.
    fn quit(&mut self) -> impl Future<Output = ()> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_command() {
        assert_eq!(SearchLimit::Depth(13).go_command(), "go depth 13");
        assert_eq!(SearchLimit::MoveTime(500).go_command(), "go movetime 500");
    }
}
