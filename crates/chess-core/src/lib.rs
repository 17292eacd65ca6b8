//! Game parsing shared by the dataset pipeline: PGN headers, mainline moves
//! and the per-game metadata attached to every dataset row.

pub mod game_data;
pub mod pgn;
