use crate::cell::{Cell, neighbors};
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;

/// The hidden minesweeper layout. Answers whether a cell is a mine and how many
/// mines surround it, and tracks which mines the player has flagged.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Board {
    pub height: usize,
    pub width: usize,
    mines: BTreeSet<Cell>,
    /// Mines the player has flagged so far.
    mines_found: BTreeSet<Cell>,
}

impl Board {
    /// Places `total_mines` mines uniformly at random.
    pub fn new<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        total_mines: usize,
        rng: &mut R,
    ) -> Self {
        if total_mines >= height * width {
            panic!("Total mines must be less than the number of cells on the board.");
        }

        let mut mines = BTreeSet::new();
        while mines.len() != total_mines {
            mines.insert(Cell {
                row: rng.random_range(0..height),
                col: rng.random_range(0..width),
            });
        }

        Board {
            height,
            width,
            mines,
            mines_found: BTreeSet::new(),
        }
    }

    /// Builds a board with a fixed layout. Out-of-bounds cells are ignored.
    pub fn with_mines(height: usize, width: usize, mines: impl IntoIterator<Item = Cell>) -> Self {
        Board {
            height,
            width,
            mines: mines
                .into_iter()
                .filter(|cell| cell.in_bounds(height, width))
                .collect(),
            mines_found: BTreeSet::new(),
        }
    }

    pub fn total_mines(&self) -> usize {
        self.mines.len()
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn mines_found(&self) -> &BTreeSet<Cell> {
        &self.mines_found
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines within one row and column of `cell`, not counting the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> u8 {
        neighbors(cell, self.height, self.width)
            .filter(|neighbor| self.mines.contains(neighbor))
            .count() as u8
    }

    /// Flags a cell as a mine. Returns whether the flag was new.
    pub fn flag(&mut self, cell: Cell) -> bool {
        self.mines_found.insert(cell)
    }

    /// The game is won once exactly the mines have been flagged.
    pub fn won(&self) -> bool {
        self.mines_found == self.mines
    }
}

/// Renders where the mines are, one `|X` or `| ` per cell.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!("{}-", "--".repeat(self.width));
        for row in 0..self.height {
            writeln!(f, "{}", separator)?;
            for col in 0..self.width {
                let mark = if self.is_mine(Cell { row, col }) { "|X" } else { "| " };
                write!(f, "{}", mark)?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{}", separator)
    }
}
