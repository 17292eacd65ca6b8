//! Tactical heuristics over a single move: sacrifice, initiative, motif
//! label and imbalance score.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::config::{AnalysisConfig, SacrificeRule};
use crate::phase::{self, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motif {
    SacrificeCheck,
    Sacrifice,
    TacticalBlow,
    Initiative,
    Quiet,
}

impl Motif {
    pub fn as_str(self) -> &'static str {
        match self {
            Motif::SacrificeCheck => "sacrifice_check",
            Motif::Sacrifice => "sacrifice",
            Motif::TacticalBlow => "tactical_blow",
            Motif::Initiative => "initiative",
            Motif::Quiet => "quiet",
        }
    }
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn mover_sign(mover: Color) -> f64 {
    match mover {
        Color::White => 1.0,
        Color::Black => -1.0,
    }
}

/// Stateless classifier. All evaluation and material inputs are White-positive
/// centipawns; orientation to the mover happens inside.
#[derive(Debug, Clone, Default)]
pub struct TacticalAnalyzer {
    config: AnalysisConfig,
}

impl TacticalAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Material given up by the mover while their evaluation held within
    /// the tolerance.
    pub fn is_sacrifice(
        &self,
        material_diff: f64,
        eval_before: f64,
        eval_after: f64,
        mover: Color,
    ) -> bool {
        let sign = mover_sign(mover);
        let material_loss = -material_diff * sign;
        if material_loss < self.config.sacrifice_material_threshold {
            return false;
        }

        let eval_change = eval_after * sign - eval_before * sign;
        eval_change >= -self.config.sacrifice_eval_tolerance
    }

    /// Variant that compares the signed material diff strictly against the
    /// threshold. Differs from [`is_sacrifice`](Self::is_sacrifice) only when
    /// the loss equals the threshold exactly.
    pub fn is_sacrifice_raw_sign(
        &self,
        material_diff: f64,
        eval_before: f64,
        eval_after: f64,
        mover: Color,
    ) -> bool {
        let sign = mover_sign(mover);
        material_diff * sign < -self.config.sacrifice_material_threshold
            && eval_after * sign >= eval_before * sign - self.config.sacrifice_eval_tolerance
    }

    /// Sacrifice test selected by [`AnalysisConfig::sacrifice_rule`].
    pub fn detect_sacrifice(
        &self,
        material_diff: f64,
        eval_before: f64,
        eval_after: f64,
        mover: Color,
    ) -> bool {
        match self.config.sacrifice_rule {
            SacrificeRule::Normalized => {
                self.is_sacrifice(material_diff, eval_before, eval_after, mover)
            }
            SacrificeRule::RawSign => {
                self.is_sacrifice_raw_sign(material_diff, eval_before, eval_after, mover)
            }
        }
    }

    /// Any large swing counts, whoever benefits.
    pub fn is_initiative(&self, eval_diff_abs: f64) -> bool {
        eval_diff_abs > self.config.initiative_eval_threshold
    }

    pub fn classify_motif(
        &self,
        is_sacrifice: bool,
        is_initiative: bool,
        is_capture: bool,
        is_check: bool,
    ) -> Motif {
        match (is_sacrifice, is_initiative, is_capture, is_check) {
            (true, _, _, true) => Motif::SacrificeCheck,
            (true, _, _, false) => Motif::Sacrifice,
            (false, true, true, _) => Motif::TacticalBlow,
            (false, true, false, _) => Motif::Initiative,
            _ => Motif::Quiet,
        }
    }

    /// Weighted sharpness of the position after the move. Never negative.
    pub fn imbalance(&self, eval_after: f64, material_diff: f64, eval_diff_abs: f64) -> f64 {
        eval_after.abs() * self.config.eval_weight
            + material_diff.abs() * self.config.material_weight
            + eval_diff_abs.abs() * self.config.eval_diff_weight
    }

    pub fn phase(&self, move_number: u32) -> Phase {
        phase::phase(
            move_number,
            self.config.opening_moves,
            self.config.endgame_moves,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> TacticalAnalyzer {
        TacticalAnalyzer::default()
    }

    #[test]
    fn test_white_exchange_sacrifice_with_compensation() {
        // White gives up 300 cp, evaluation climbs from 0 to +2.00
        assert!(analyzer().is_sacrifice(-300.0, 0.0, 200.0, Color::White));
    }

    #[test]
    fn test_white_loses_material_and_position() {
        assert!(!analyzer().is_sacrifice(-300.0, 0.0, -300.0, Color::White));
    }

    #[test]
    fn test_black_sacrifice_is_mirrored() {
        // Black giving up material pushes the White-positive balance up
        assert!(analyzer().is_sacrifice(300.0, 0.0, -200.0, Color::Black));
        assert!(!analyzer().is_sacrifice(300.0, 0.0, 300.0, Color::Black));
        // Material gain for the mover is never a sacrifice
        assert!(!analyzer().is_sacrifice(-300.0, 0.0, -200.0, Color::Black));
    }

    #[test]
    fn test_small_material_loss_is_not_sacrifice() {
        assert!(!analyzer().is_sacrifice(-100.0, 0.0, 500.0, Color::White));
        assert!(!analyzer().is_sacrifice(-149.0, 0.0, 500.0, Color::White));
    }

    #[test]
    fn test_tolerance_boundary() {
        let a = analyzer();
        assert!(a.is_sacrifice(-300.0, 100.0, 50.0, Color::White));
        assert!(!a.is_sacrifice(-300.0, 100.0, 49.0, Color::White));
    }

    #[test]
    fn test_raw_sign_differs_only_at_threshold() {
        let a = analyzer();
        assert!(a.is_sacrifice(-150.0, 0.0, 0.0, Color::White));
        assert!(!a.is_sacrifice_raw_sign(-150.0, 0.0, 0.0, Color::White));

        assert!(a.is_sacrifice_raw_sign(-151.0, 0.0, 0.0, Color::White));
        assert!(a.is_sacrifice_raw_sign(300.0, 0.0, -200.0, Color::Black));
        assert!(!a.is_sacrifice_raw_sign(-300.0, 0.0, -300.0, Color::White));
    }

    #[test]
    fn test_detect_sacrifice_follows_rule() {
        let normalized = analyzer();
        assert!(normalized.detect_sacrifice(-150.0, 0.0, 0.0, Color::White));

        let raw = TacticalAnalyzer::new(AnalysisConfig {
            sacrifice_rule: SacrificeRule::RawSign,
            ..Default::default()
        });
        assert!(!raw.detect_sacrifice(-150.0, 0.0, 0.0, Color::White));
    }

    #[test]
    fn test_initiative_boundary() {
        let a = analyzer();
        assert!(!a.is_initiative(80.0));
        assert!(a.is_initiative(81.0));
        assert!(!a.is_initiative(0.0));
    }

    #[test]
    fn test_motif_precedence() {
        let a = analyzer();
        assert_eq!(a.classify_motif(true, false, false, true), Motif::SacrificeCheck);
        assert_eq!(a.classify_motif(true, true, true, false), Motif::Sacrifice);
        assert_eq!(a.classify_motif(false, true, true, false), Motif::TacticalBlow);
        assert_eq!(a.classify_motif(false, true, false, true), Motif::Initiative);
        assert_eq!(a.classify_motif(false, false, true, true), Motif::Quiet);
        assert_eq!(a.classify_motif(false, false, false, false), Motif::Quiet);
    }

    #[test]
    fn test_motif_labels() {
        assert_eq!(Motif::TacticalBlow.to_string(), "tactical_blow");
        assert_eq!(
            serde_json::to_string(&Motif::SacrificeCheck).unwrap(),
            "\"sacrifice_check\""
        );
    }

    #[test]
    fn test_imbalance_formula() {
        let a = analyzer();
        let score = a.imbalance(-200.0, 300.0, 150.0);
        assert!((score - (200.0 * 0.6 + 300.0 * 0.1 + 150.0 * 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_imbalance_non_negative_and_zero_only_at_origin() {
        let a = analyzer();
        assert_eq!(a.imbalance(0.0, 0.0, 0.0), 0.0);

        let samples = [-10000.0, -350.5, -1.0, 0.0, 0.5, 42.0, 10000.0];
        for &e in &samples {
            for &m in &samples {
                for &d in &samples {
                    let score = a.imbalance(e, m, d.abs());
                    assert!(score >= 0.0);
                    if e != 0.0 || m != 0.0 || d != 0.0 {
                        assert!(score > 0.0, "zero score for ({e}, {m}, {d})");
                    }
                }
            }
        }
    }

    #[test]
    fn test_phase_uses_config_boundaries() {
        let a = TacticalAnalyzer::new(AnalysisConfig {
            opening_moves: 10,
            endgame_moves: 30,
            ..Default::default()
        });
        assert_eq!(a.phase(10), Phase::Opening);
        assert_eq!(a.phase(11), Phase::Middlegame);
        assert_eq!(a.phase(31), Phase::Endgame);
    }
}
