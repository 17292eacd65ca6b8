//! PGN parsing utilities: a lightweight regex-based parser.
//!
//! Comments, NAGs and variations are stripped rather than interpreted; only the
//! mainline is replayed.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Move, Position};
use thiserror::Error;

use crate::game_data::{GameData, GameMetadata};

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid header regex"));
static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid header line regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("valid comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("valid variation regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?|0-0-0[+#]?|0-0[+#]?")
        .expect("valid move regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("game has no moves")]
    NoMoves,

    #[error("non-standard starting position: {0}")]
    NonStandardStart(String),

    #[error("unreadable SAN '{san}' at ply {ply}")]
    InvalidSan { ply: usize, san: String },

    #[error("illegal move '{san}' at ply {ply}")]
    IllegalMove { ply: usize, san: String },
}

/// Split a multi-game PGN file into one chunk per game.
/// A new game starts at the first header line that follows movetext.
pub fn split_games(text: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();
    let mut in_movetext = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            if in_movetext {
                games.push(std::mem::take(&mut current));
                in_movetext = false;
            }
        } else if !trimmed.is_empty() {
            in_movetext = true;
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.trim().is_empty() {
        games.push(current);
    }
    games
}

/// Parse every game in a PGN file. Each game succeeds or fails on its own.
pub fn parse_pgn_games(text: &str) -> Vec<Result<GameData, PgnError>> {
    split_games(text).iter().map(|g| parse_pgn(g)).collect()
}

/// Parse a single-game PGN string into a GameData struct.
pub fn parse_pgn(pgn: &str) -> Result<GameData, PgnError> {
    let headers = extract_headers(pgn);

    // Filter non-standard positions
    if headers.get("SetUp").map(String::as_str) == Some("1") {
        if let Some(fen) = headers.get("FEN") {
            if fen != STANDARD_START_FEN {
                return Err(PgnError::NonStandardStart(fen.clone()));
            }
        }
    }

    let san_moves = extract_moves(pgn);
    if san_moves.is_empty() {
        return Err(PgnError::NoMoves);
    }

    Ok(GameData {
        metadata: GameMetadata::from_headers(&headers),
        moves: replay_moves(&san_moves)?,
    })
}

/// Extract all `[Key "Value"]` headers into a flat map.
pub fn extract_headers(pgn: &str) -> BTreeMap<String, String> {
    HEADER_RE
        .captures_iter(pgn)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect()
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
pub fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, "");
    let mut text = COMMENT_RE.replace_all(&no_headers, "").into_owned();

    // Innermost variations first, until nested ones are gone too
    while VARIATION_RE.is_match(&text) {
        text = VARIATION_RE.replace_all(&text, "").into_owned();
    }

    MOVE_RE
        .find_iter(&text)
        .map(|m| m.as_str().replace('0', "O"))
        .collect()
}

/// Replay SAN moves from the standard position, resolving each to a legal move.
pub fn replay_moves(san_moves: &[String]) -> Result<Vec<Move>, PgnError> {
    let mut pos = Chess::default();
    let mut moves = Vec::with_capacity(san_moves.len());

    for (i, san) in san_moves.iter().enumerate() {
        let ply = i + 1;
        let san_plus = SanPlus::from_ascii(san.as_bytes()).map_err(|_| PgnError::InvalidSan {
            ply,
            san: san.clone(),
        })?;
        let mv = san_plus
            .san
            .to_move(&pos)
            .map_err(|_| PgnError::IllegalMove {
                ply,
                san: san.clone(),
            })?;
        pos.play_unchecked(mv.clone());
        moves.push(mv);
    }

    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAL_SMYSLOV: &str = r#"[Event "Candidates Tournament"]
[Site "Bled/Zagreb/Belgrade"]
[Date "1959.09.18"]
[Round "8"]
[White "Tal, Mikhail"]
[Black "Smyslov, Vassily"]
[Result "1-0"]
[ECO "B10"]

1. e4 c6 2. d3 d5 3. Nd2 e5 4. Ngf3 Nd7 5. d4 dxe4 6. Nxe4 exd4
7. Qxd4 Ngf6 8. Bg5 Be7 9. O-O-O O-O 10. Nd6 Qa5 1-0
"#;

    #[test]
    fn test_parse_pgn_basic() {
        let game = parse_pgn(TAL_SMYSLOV).unwrap();
        assert_eq!(game.metadata.white, "Tal, Mikhail");
        assert_eq!(game.metadata.black, "Smyslov, Vassily");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.metadata.eco, "B10");
        assert_eq!(game.metadata.round, "8");
        assert_eq!(game.moves.len(), 20);
    }

    #[test]
    fn test_extract_moves_strips_comments_and_variations() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3)) 2. Nf3 $1 Nc6 ; tail\n3. Bb5 *";
        let moves = extract_moves(pgn);
        assert_eq!(moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]);
    }

    #[test]
    fn test_zero_castling_normalized() {
        let moves = extract_moves("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. 0-0 *");
        assert_eq!(moves.last().map(String::as_str), Some("O-O"));
    }

    #[test]
    fn test_split_multiple_games() {
        let text = format!("{TAL_SMYSLOV}\n[Event \"Test\"]\n[White \"A\"]\n[Black \"B\"]\n\n1. d4 d5 *\n");
        let games = parse_pgn_games(&text);
        assert_eq!(games.len(), 2);
        assert_eq!(games[1].as_ref().unwrap().metadata.white, "A");
        assert_eq!(games[1].as_ref().unwrap().moves.len(), 2);
    }

    #[test]
    fn test_empty_game_is_rejected() {
        let pgn = "[Event \"Test\"]\n[White \"Player1\"]\n[Black \"Player2\"]\n\n*\n";
        assert_eq!(parse_pgn(pgn).unwrap_err(), PgnError::NoMoves);
    }

    #[test]
    fn test_illegal_move_reports_ply() {
        let err = parse_pgn("1. e4 e5 2. Ke3 *").unwrap_err();
        assert_eq!(
            err,
            PgnError::IllegalMove {
                ply: 3,
                san: "Ke3".to_string()
            }
        );
    }

    #[test]
    fn test_non_standard_start_filtered() {
        let pgn = "[SetUp \"1\"]\n[FEN \"8/8/8/8/8/8/8/K6k w - - 0 1\"]\n\n1. Kb1 *";
        assert!(matches!(
            parse_pgn(pgn),
            Err(PgnError::NonStandardStart(_))
        ));
    }
}
