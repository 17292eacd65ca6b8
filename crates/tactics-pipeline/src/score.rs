//! Engine score → centipawn conversion (White-positive).

use shakmaty::Color;

/// Fixed magnitude reported for any forced mate, regardless of distance.
pub const MATE_VALUE: f64 = 10000.0;

/// Score as reported by the engine on an `info ... score` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawScore {
    /// Centipawns
    Cp(i32),
    /// Mate in N moves (positive = side the score is relative to wins)
    Mate(i32),
}

impl RawScore {
    /// UCI scores are relative to the side to move; flip them to White's view.
    /// `mate 0` means the side to move is already mated, so for Black it
    /// becomes a White win.
    pub fn white_pov(self, side_to_move: Color) -> Self {
        match (self, side_to_move) {
            (score, Color::White) => score,
            (RawScore::Cp(cp), Color::Black) => RawScore::Cp(cp.saturating_neg()),
            (RawScore::Mate(0), Color::Black) => RawScore::Mate(1),
            (RawScore::Mate(n), Color::Black) => RawScore::Mate(-n),
        }
    }
}

/// Convert a White-POV score to centipawns.
///
/// A missing score is treated as neutral (`0.0`) so a single bad engine reply
/// never aborts the game. Mates collapse to `±MATE_VALUE`; mate 0 (side to
/// move is already mated) counts as a loss for that side.
pub fn to_centipawns(score: Option<RawScore>) -> f64 {
    match score {
        None => 0.0,
        Some(RawScore::Mate(n)) if n > 0 => MATE_VALUE,
        Some(RawScore::Mate(_)) => -MATE_VALUE,
        Some(RawScore::Cp(cp)) => f64::from(cp),
    }
}

/// Format a centipawn value in pawns for display (`+1.45`, `-0.32`).
/// Mate sentinels render as `#10` / `#-10`.
pub fn format_eval(cp: f64) -> String {
    if cp.abs() >= MATE_VALUE {
        let sign = if cp > 0.0 { "" } else { "-" };
        format!("#{sign}{}", (MATE_VALUE / 1000.0) as i32)
    } else {
        format!("{:+.2}", cp / 100.0)
    }
}
