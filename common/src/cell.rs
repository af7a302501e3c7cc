use std::fmt;

/// A (row, column) coordinate on the minesweeper board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// Whether the cell lies on a board of the given size.
    pub fn in_bounds(self, height: usize, width: usize) -> bool {
        self.row < height && self.col < width
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// All in-bounds cells within one row and column of `cell`, excluding the cell itself.
/// Corners yield 3 neighbours, edges 5, interior cells 8.
pub fn neighbors(cell: Cell, height: usize, width: usize) -> impl Iterator<Item = Cell> {
    (-1..=1).flat_map(move |dr| {
        (-1..=1).filter_map(move |dc| {
            if dr == 0 && dc == 0 {
                return None;
            }

            let nr = cell.row as isize + dr;
            let nc = cell.col as isize + dc;

            if nr >= 0 && nr < height as isize && nc >= 0 && nc < width as isize {
                Some(Cell {
                    row: nr as usize,
                    col: nc as usize,
                })
            } else {
                None
            }
        })
    })
}

/// Every cell on a board of the given size, in row-major order.
pub fn all_cells(height: usize, width: usize) -> impl Iterator<Item = Cell> {
    (0..height).flat_map(move |row| (0..width).map(move |col| Cell { row, col }))
}
