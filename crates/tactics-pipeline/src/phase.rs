//! Game phase by move number.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Middlegame => "middlegame",
            Phase::Endgame => "endgame",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game phase from the move number. Both boundaries are inclusive upper
/// bounds of their band.
pub fn phase(move_number: u32, opening_moves: u32, endgame_moves: u32) -> Phase {
    if move_number <= opening_moves {
        Phase::Opening
    } else if move_number <= endgame_moves {
        Phase::Middlegame
    } else {
        Phase::Endgame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boundaries() {
        assert_eq!(phase(0, 15, 40), Phase::Opening);
        assert_eq!(phase(5, 15, 40), Phase::Opening);
        assert_eq!(phase(15, 15, 40), Phase::Opening);
        assert_eq!(phase(16, 15, 40), Phase::Middlegame);
        assert_eq!(phase(40, 15, 40), Phase::Middlegame);
        assert_eq!(phase(41, 15, 40), Phase::Endgame);
        assert_eq!(phase(u32::MAX, 15, 40), Phase::Endgame);
    }

    #[test]
    fn test_monotonic() {
        let mut last = Phase::Opening;
        for m in 0..200 {
            let p = phase(m, 15, 40);
            assert!(p >= last, "phase went backwards at move {m}");
            last = p;
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Phase::Middlegame.to_string(), "middlegame");
        assert_eq!(serde_json::to_string(&Phase::Endgame).unwrap(), "\"endgame\"");
    }
}
