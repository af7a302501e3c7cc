use crate::cell::Cell;
use crate::constraint::Constraint;

/// Reasons the inference engine refuses an update.
///
/// Each variant means the facts fed to the engine cannot all be true at once.
/// The engine's knowledge after an error is not meaningful and should be discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("cell {cell} is outside the {height}x{width} board")]
    OutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },

    #[error(
        "observation at {cell} reports {count} mines, but {known_mines} neighbours are known mines and {unresolved} are unresolved"
    )]
    InconsistentObservation {
        cell: Cell,
        count: usize,
        known_mines: usize,
        unresolved: usize,
    },

    #[error("cell {cell} is deduced to be both a mine and safe")]
    Contradiction { cell: Cell },

    #[error("subset inference of {superset} minus {subset} leaves an impossible mine count")]
    InconsistentDerivation {
        subset: Constraint,
        superset: Constraint,
    },

    #[error("closure did not stabilise within {limit} passes")]
    PassLimitExceeded { limit: usize },
}
