//! Material balance from piece counts (centipawns, White minus Black)

use serde::{Deserialize, Serialize};
use shakmaty::{Board, Color, Role};

// Piece values for material calculation
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

const ROLES: [Role; 6] = [
    Role::Pawn,
    Role::Knight,
    Role::Bishop,
    Role::Rook,
    Role::Queen,
    Role::King,
];

/// Piece value (king counts as zero)
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => 0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSnapshot {
    pub white: i32,
    pub black: i32,
    pub balance: i32,
}

/// Total material of one side
pub fn side_total(board: &Board, color: Color) -> i32 {
    ROLES
        .iter()
        .map(|&role| board.by_piece(role.of(color)).count() as i32 * piece_value(role))
        .sum()
}

/// Material snapshot for a position
pub fn evaluate(board: &Board) -> MaterialSnapshot {
    let white = side_total(board, Color::White);
    let black = side_total(board, Color::Black);
    MaterialSnapshot {
        white,
        black,
        balance: white - black,
    }
}
