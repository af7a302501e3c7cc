//! Knowledge-based Minesweeper agent.
//!
//! The agent keeps a set of statements of the form "exactly `count` of these
//! cells are mines" and closes them under two rules after every observation:
//! a statement with count 0 or count equal to its size resolves all its cells,
//! and a statement whose cells are a strict subset of another's splits the
//! larger one into the difference. Moves are proven-safe cells when any exist,
//! random guesses otherwise.

pub mod board;
pub mod cell;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod game;
pub mod settings;

pub use board::Board;
pub use cell::{Cell, all_cells, neighbors};
pub use constraint::Constraint;
pub use engine::{EngineConfig, InferenceEngine};
pub use error::InferenceError;
pub use game::{Game, GameState, Move, MoveSource, Tile};
pub use settings::{CliOverrides, Settings};
