//! Classic falling-block puzzle engine.
//!
//! The [`game::Game`] session owns the board, the falling piece and the
//! scoring state. A driver feeds it input and a millisecond clock through
//! [`game::Game::tick`], reads its state to render, and hands the finished
//! game to a [`leaderboard::Leaderboard`].

pub mod board;
pub mod config;
pub mod game;
pub mod leaderboard;
pub mod lock;
pub mod piece;
pub mod scoring;

pub use board::{Board, Cell, BOARD_HEIGHT, BOARD_WIDTH};
pub use config::{EngineConfig, Gravity};
pub use game::{Game, GameEvent, GameState, GameSummary, RenderCell, Snapshot};
pub use leaderboard::{Leaderboard, LeaderboardError, ScoreRecord};
pub use piece::{
    ActivePiece, PieceKind, PieceProvider, Position, RandomPieceProvider, SequencePieceProvider, Shape,
};
