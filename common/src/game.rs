use crate::board::Board;
use crate::cell::Cell;
use crate::engine::{EngineConfig, InferenceEngine};
use crate::settings::Settings;
use anyhow::Context;
use rand::Rng;
use std::collections::BTreeMap;

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// What the player can see of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Hidden,
    Flagged,
    Revealed(u8), // The u8 is the number of adjacent mines.
}

/// Why the agent picked a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    /// The cell was proven safe.
    Deduced,
    /// Nothing was provable, so the agent guessed.
    Random,
}

/// One turn of autoplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub cell: Cell,
    pub source: MoveSource,
    /// Adjacent mine count, or `None` when the cell was a mine.
    pub revealed: Option<u8>,
}

/// A board paired with the agent playing it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Game {
    pub board: Board,
    pub agent: InferenceEngine,
    /// Revealed cells and their adjacent mine counts.
    pub revealed: BTreeMap<Cell, u8>,
    pub game_state: GameState,
}

impl Game {
    pub fn new<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Self {
        let board = Board::new(
            settings.board.height,
            settings.board.width,
            settings.board.mines,
            rng,
        );
        Self::from_board(board, settings.engine.clone())
    }

    pub fn from_board(board: Board, config: EngineConfig) -> Self {
        let agent = InferenceEngine::with_config(board.height, board.width, config);
        Game {
            board,
            agent,
            revealed: BTreeMap::new(),
            game_state: GameState::Playing,
        }
    }

    /// Deserializes a game state from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        bcs::from_bytes(bts).context("malformed game state")
    }

    /// Serializes the game state to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        bcs::to_bytes(self).context("game state serialization failed")
    }

    /// Plays one turn: a proven-safe cell if the agent has one, a random guess
    /// otherwise. Returns `None` when no cell is left to try.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<Option<Move>> {
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }

        let (cell, source) = match self.agent.next_safe_move() {
            Some(cell) => (cell, MoveSource::Deduced),
            None => match self.agent.next_random_move(rng) {
                Some(cell) => (cell, MoveSource::Random),
                None => return Ok(None),
            },
        };

        let revealed = self.reveal_cell(cell)?;
        Ok(Some(Move {
            cell,
            source,
            revealed,
        }))
    }

    /// Steps until the game is decided or no move is left.
    pub fn play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<GameState> {
        while self.game_state == GameState::Playing {
            if self.step(rng)?.is_none() {
                break;
            }
        }
        Ok(self.game_state)
    }

    /// Reveals `at`, feeds the observation to the agent and flags every mine the
    /// agent now knows. Returns the adjacent mine count, or `None` if `at` was a mine.
    pub fn reveal_cell(&mut self, at: Cell) -> anyhow::Result<Option<u8>> {
        if !at.in_bounds(self.board.height, self.board.width) {
            anyhow::bail!("cell {} is off the board", at);
        }
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }
        if let Some(&count) = self.revealed.get(&at) {
            return Ok(Some(count));
        }

        if self.board.is_mine(at) {
            self.game_state = GameState::Lost;
            return Ok(None);
        }

        let count = self.board.nearby_mines(at);
        self.revealed.insert(at, count);
        self.agent
            .record_observation(at, count as usize)
            .with_context(|| format!("agent rejected observation {} = {}", at, count))?;

        for &mine in self.agent.mines() {
            self.board.flag(mine);
        }

        if self.check_win_condition() {
            self.game_state = GameState::Won;
        }

        Ok(Some(count))
    }

    /// Won once every mine is flagged or every safe cell is revealed.
    pub fn check_win_condition(&self) -> bool {
        let safe_cells = self.board.height * self.board.width - self.board.total_mines();
        self.board.won() || self.revealed.len() == safe_cells
    }

    /// The player's view of the board, row by row.
    pub fn tiles(&self) -> Vec<Vec<Tile>> {
        (0..self.board.height)
            .map(|row| {
                (0..self.board.width)
                    .map(|col| {
                        let cell = Cell { row, col };
                        match self.revealed.get(&cell) {
                            Some(&count) => Tile::Revealed(count),
                            None if self.board.mines_found().contains(&cell) => Tile::Flagged,
                            None => Tile::Hidden,
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
