//! Per-move tactical feature extraction for chess game collections.

pub use chess_core;

pub mod analyzer;
pub mod batch;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod input;
pub mod material;
pub mod oracle;
pub mod phase;
pub mod score;
pub mod stockfish;
pub mod tactics;
