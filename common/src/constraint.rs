use crate::cell::Cell;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// The count never exceeds the number of cells. Cells leave the statement as they
/// become known mines or known safes, so a constraint only ever mentions unresolved cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawConstraint")]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

/// Wire form of a [`Constraint`], checked before it becomes one.
#[derive(serde::Deserialize)]
struct RawConstraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl TryFrom<RawConstraint> for Constraint {
    type Error = String;

    fn try_from(raw: RawConstraint) -> Result<Self, Self::Error> {
        if raw.count > raw.cells.len() {
            return Err(format!(
                "constraint claims {} mines among {} cells",
                raw.count,
                raw.cells.len()
            ));
        }
        Ok(Constraint {
            cells: raw.cells,
            count: raw.count,
        })
    }
}

impl Constraint {
    /// Panics if `count` is larger than the number of distinct cells.
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        assert!(
            count <= cells.len(),
            "constraint claims {} mines among {} cells",
            count,
            cells.len()
        );
        Constraint { cells, count }
    }

    /// Skips the count check, for building corrupted state in tests.
    #[cfg(test)]
    pub(crate) fn unchecked(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        Constraint {
            cells: cells.into_iter().collect(),
            count,
        }
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.cells.contains(cell)
    }

    /// True when every cell of `self` is in `other` and `other` has at least one more.
    pub fn is_strict_subset_of(&self, other: &Constraint) -> bool {
        self.cells.len() < other.cells.len() && self.cells.is_subset(&other.cells)
    }

    /// Every remaining cell is a mine when the count equals the number of cells.
    pub fn known_mines(&self) -> BTreeSet<Cell> {
        if self.count == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Every remaining cell is safe when the count is zero.
    pub fn known_safes(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Removes a cell known to be a mine; it was one of the mines this statement counted.
    pub fn mark_mine(&mut self, cell: Cell) {
        if self.cells.remove(&cell) {
            assert!(
                self.count > 0,
                "mine {} removed from a constraint that allows no mines",
                cell
            );
            self.count -= 1;
        }
    }

    /// Removes a cell known to be safe.
    pub fn mark_safe(&mut self, cell: Cell) {
        if self.cells.remove(&cell) {
            assert!(
                self.count <= self.cells.len(),
                "safe {} removed from a constraint whose cells are all mines",
                cell
            );
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}
