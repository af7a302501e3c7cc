use crate::cell::{Cell, all_cells, neighbors};
use crate::constraint::Constraint;
use crate::error::InferenceError;
use itertools::Itertools;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;

/// Tuning knobs for the inference engine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Upper bound on closure passes per update. The closure always terminates on
    /// consistent input, so hitting this bound signals a broken invariant.
    pub max_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { max_passes: 10_000 }
    }
}

/// Knowledge-based minesweeper player.
///
/// Holds every statement learned so far plus the cells resolved as safe or mine,
/// and keeps the statements closed under the minesweeper deduction rules after
/// every update.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InferenceEngine {
    height: usize,
    width: usize,
    config: EngineConfig,
    /// Cells the agent has already chosen.
    moves_made: BTreeSet<Cell>,
    /// Cells proven to be mines.
    mines: BTreeSet<Cell>,
    /// Cells proven to be safe.
    safes: BTreeSet<Cell>,
    /// Statements known to be true, free of duplicates and of resolved cells.
    knowledge: Vec<Constraint>,
}

impl InferenceEngine {
    pub fn new(height: usize, width: usize) -> Self {
        Self::with_config(height, width, EngineConfig::default())
    }

    pub fn with_config(height: usize, width: usize, config: EngineConfig) -> Self {
        InferenceEngine {
            height,
            width,
            config,
            moves_made: BTreeSet::new(),
            mines: BTreeSet::new(),
            safes: BTreeSet::new(),
            knowledge: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn safes(&self) -> &BTreeSet<Cell> {
        &self.safes
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn knowledge(&self) -> &[Constraint] {
        &self.knowledge
    }

    fn check_bounds(&self, cell: Cell) -> Result<(), InferenceError> {
        if cell.in_bounds(self.height, self.width) {
            Ok(())
        } else {
            Err(InferenceError::OutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// Records `cell` as a mine and removes it from every statement.
    ///
    /// Fails if the cell is off the board, already known safe, or mentioned by a
    /// statement that allows no mines.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<(), InferenceError> {
        self.check_bounds(cell)?;
        if self.safes.contains(&cell)
            || self
                .knowledge
                .iter()
                .any(|c| c.contains(&cell) && c.count() == 0)
        {
            return Err(InferenceError::Contradiction { cell });
        }

        self.mines.insert(cell);
        for constraint in &mut self.knowledge {
            constraint.mark_mine(cell);
        }
        Ok(())
    }

    /// Records `cell` as safe and removes it from every statement.
    ///
    /// Fails if the cell is off the board, already known to be a mine, or mentioned
    /// by a statement that needs all of its cells to be mines.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<(), InferenceError> {
        self.check_bounds(cell)?;
        if self.mines.contains(&cell)
            || self
                .knowledge
                .iter()
                .any(|c| c.contains(&cell) && c.count() == c.len())
        {
            return Err(InferenceError::Contradiction { cell });
        }

        self.safes.insert(cell);
        for constraint in &mut self.knowledge {
            constraint.mark_safe(cell);
        }
        Ok(())
    }

    /// Called when the board reveals that `cell` is safe and has `count` mines
    /// around it.
    ///
    /// The cell becomes a made move and a known safe; its unresolved neighbours form a
    /// new statement (with known mines subtracted from the count); then the
    /// knowledge base is closed again. The observation is rejected without touching
    /// any state when the cell is off the board or a known mine, or when its count
    /// cannot fit the neighbourhood.
    pub fn record_observation(&mut self, cell: Cell, count: usize) -> Result<(), InferenceError> {
        self.check_bounds(cell)?;

        let mut known_mines = 0;
        let mut unresolved = BTreeSet::new();
        for neighbor in neighbors(cell, self.height, self.width) {
            if self.mines.contains(&neighbor) {
                known_mines += 1;
            } else if !self.safes.contains(&neighbor) {
                unresolved.insert(neighbor);
            }
        }

        let remaining = count
            .checked_sub(known_mines)
            .filter(|&remaining| remaining <= unresolved.len())
            .ok_or(InferenceError::InconsistentObservation {
                cell,
                count,
                known_mines,
                unresolved: unresolved.len(),
            })?;

        self.mark_safe(cell)?;
        self.moves_made.insert(cell);

        if !unresolved.is_empty() {
            self.add_constraint(Constraint::new(unresolved, remaining))?;
        }

        self.infer()
    }

    /// Adds a statement unless an equal one is already known. Known mines and safes
    /// are folded into it first; cells off the board are rejected.
    ///
    /// Returns whether the knowledge base grew. Closure is not run; call
    /// [`InferenceEngine::infer`] afterwards.
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<bool, InferenceError> {
        for &cell in constraint.cells() {
            self.check_bounds(cell)?;
        }

        let resolved: Vec<Cell> = constraint
            .cells()
            .iter()
            .filter(|cell| self.mines.contains(cell) || self.safes.contains(cell))
            .copied()
            .collect();

        for cell in resolved {
            if self.mines.contains(&cell) {
                if constraint.count() == 0 {
                    return Err(InferenceError::Contradiction { cell });
                }
                constraint.mark_mine(cell);
            } else {
                if constraint.count() == constraint.len() {
                    return Err(InferenceError::Contradiction { cell });
                }
                constraint.mark_safe(cell);
            }
        }

        if constraint.is_empty() || self.knowledge.contains(&constraint) {
            return Ok(false);
        }
        self.knowledge.push(constraint);
        Ok(true)
    }

    /// Runs the closure to a fixed point: apply trivial deductions, drop spent
    /// statements, derive new statements from subset pairs, until a pass changes
    /// nothing.
    pub fn infer(&mut self) -> Result<(), InferenceError> {
        for _ in 0..self.config.max_passes {
            let deduced = self.apply_facts()?;
            let removed = self.remove_empty();
            let derived = self.derive_subsets()?;

            if !(deduced || removed || derived) {
                return Ok(());
            }
        }

        Err(InferenceError::PassLimitExceeded {
            limit: self.config.max_passes,
        })
    }

    /// Marks every cell that some statement pins down as all-mines or all-safe.
    /// Returns whether a new cell was resolved.
    fn apply_facts(&mut self) -> Result<bool, InferenceError> {
        let mut new_mines = BTreeSet::new();
        let mut new_safes = BTreeSet::new();
        for constraint in &self.knowledge {
            new_mines.extend(constraint.known_mines());
            new_safes.extend(constraint.known_safes());
        }

        let changed = !new_mines.is_empty() || !new_safes.is_empty();
        for cell in new_mines {
            self.mark_mine(cell)?;
        }
        for cell in new_safes {
            self.mark_safe(cell)?;
        }
        Ok(changed)
    }

    /// Drops statements with no cells left, and collapses statements that
    /// simplification made identical. Returns whether anything was dropped.
    fn remove_empty(&mut self) -> bool {
        let before = self.knowledge.len();
        self.knowledge = std::mem::take(&mut self.knowledge)
            .into_iter()
            .filter(|constraint| !constraint.is_empty())
            .unique()
            .collect();
        self.knowledge.len() != before
    }

    /// For each pair where one statement's cells are a strict subset of the
    /// other's, the cells only in the larger statement hold the difference of
    /// the counts. Returns whether a new statement was added.
    fn derive_subsets(&mut self) -> Result<bool, InferenceError> {
        let mut derived: Vec<Constraint> = Vec::new();

        for (a, b) in self.knowledge.iter().tuple_combinations() {
            let (subset, superset) = if a.is_strict_subset_of(b) {
                (a, b)
            } else if b.is_strict_subset_of(a) {
                (b, a)
            } else {
                continue;
            };

            let cells: BTreeSet<Cell> = superset
                .cells()
                .difference(subset.cells())
                .copied()
                .collect();
            let count = superset
                .count()
                .checked_sub(subset.count())
                .filter(|&count| count <= cells.len())
                .ok_or_else(|| InferenceError::InconsistentDerivation {
                    subset: subset.clone(),
                    superset: superset.clone(),
                })?;

            let constraint = Constraint::new(cells, count);
            if !self.knowledge.contains(&constraint) && !derived.contains(&constraint) {
                derived.push(constraint);
            }
        }

        let changed = !derived.is_empty();
        self.knowledge.extend(derived);
        Ok(changed)
    }

    /// A cell proven safe that has not been played yet. Picks the smallest such
    /// cell so play is reproducible.
    pub fn next_safe_move(&self) -> Option<Cell> {
        self.safes.difference(&self.moves_made).next().copied()
    }

    /// A uniformly random cell that has not been played and is not a known mine.
    pub fn next_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let candidates: Vec<Cell> = all_cells(self.height, self.width)
            .filter(|cell| !self.moves_made.contains(cell) && !self.mines.contains(cell))
            .collect();
        candidates.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn c(row: usize, col: usize) -> Cell {
        Cell::new(row, col)
    }

    #[test]
    fn test_zero_observation_marks_neighbors_safe() {
        let mut engine = InferenceEngine::new(3, 3);
        engine.record_observation(c(0, 0), 0).unwrap();

        assert!(engine.moves_made().contains(&c(0, 0)));
        for cell in [c(0, 0), c(0, 1), c(1, 0), c(1, 1)] {
            assert!(engine.safes().contains(&cell), "{cell} should be safe");
        }
        assert!(engine.mines().is_empty());
        // The statement was fully spent.
        assert!(engine.knowledge().is_empty());
    }

    #[test]
    fn test_end_to_end_single_mine_in_corner() {
        // 3x3 board with one mine at (2, 2).
        let mut engine = InferenceEngine::new(3, 3);
        engine.record_observation(c(0, 0), 0).unwrap();
        assert!(engine.safes().is_superset(&BTreeSet::from([c(0, 1), c(1, 0), c(1, 1)])));

        engine.record_observation(c(0, 2), 0).unwrap();
        engine.record_observation(c(2, 0), 0).unwrap();
        assert!(engine.safes().contains(&c(1, 2)));
        assert!(engine.safes().contains(&c(2, 1)));
        assert!(engine.mines().is_empty());

        engine.record_observation(c(1, 1), 1).unwrap();
        assert_eq!(engine.mines(), &BTreeSet::from([c(2, 2)]));
        assert!(engine.safes().is_disjoint(engine.mines()));
    }

    #[test]
    fn test_count_equal_to_neighbors_marks_mines() {
        let mut engine = InferenceEngine::new(2, 2);
        engine.record_observation(c(0, 0), 3).unwrap();
        assert_eq!(engine.mines(), &BTreeSet::from([c(0, 1), c(1, 0), c(1, 1)]));
        assert_eq!(engine.next_safe_move(), None);
    }

    #[test]
    fn test_known_mines_reduce_observation_count() {
        let mut engine = InferenceEngine::new(1, 4);
        engine.mark_mine(c(0, 0)).unwrap();
        // (0, 1) sees the known mine at (0, 0) plus one of {(0, 2)}.
        engine.record_observation(c(0, 1), 2).unwrap();
        assert!(engine.mines().contains(&c(0, 2)));
    }

    #[test]
    fn test_subset_inference() {
        let mut engine = InferenceEngine::new(1, 5);
        let a = Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 1);
        let b = Constraint::new([c(0, 0), c(0, 1), c(0, 2), c(0, 3), c(0, 4)], 2);
        assert!(engine.add_constraint(a.clone()).unwrap());
        assert!(engine.add_constraint(b.clone()).unwrap());

        engine.infer().unwrap();

        let derived = Constraint::new([c(0, 3), c(0, 4)], 1);
        assert!(engine.knowledge().contains(&derived));
        assert!(engine.knowledge().contains(&a));
        assert!(engine.knowledge().contains(&b));
        assert_eq!(engine.knowledge().len(), 3);
        assert!(engine.mines().is_empty());
        assert!(engine.safes().is_empty());
    }

    #[test]
    fn test_subset_inference_resolves_cells() {
        // {a, b} = 1 and {a, b, c} = 2 leave c as a mine.
        let mut engine = InferenceEngine::new(1, 3);
        engine
            .add_constraint(Constraint::new([c(0, 0), c(0, 1)], 1))
            .unwrap();
        engine
            .add_constraint(Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 2))
            .unwrap();
        engine.infer().unwrap();

        assert_eq!(engine.mines(), &BTreeSet::from([c(0, 2)]));
        assert_eq!(
            engine.knowledge(),
            &[Constraint::new([c(0, 0), c(0, 1)], 1)]
        );
    }

    #[test]
    fn test_duplicate_constraint_is_not_added() {
        let mut engine = InferenceEngine::new(2, 2);
        let constraint = Constraint::new([c(0, 0), c(0, 1)], 1);
        assert!(engine.add_constraint(constraint.clone()).unwrap());
        assert!(!engine.add_constraint(constraint.clone()).unwrap());
        assert_eq!(engine.knowledge().len(), 1);

        // Same observation twice adds nothing new.
        let mut engine = InferenceEngine::new(3, 3);
        engine.record_observation(c(1, 1), 1).unwrap();
        let before = engine.knowledge().to_vec();
        engine.record_observation(c(1, 1), 1).unwrap();
        assert_eq!(engine.knowledge(), before.as_slice());
    }

    #[test]
    fn test_simplification_collapses_equal_constraints() {
        let mut engine = InferenceEngine::new(1, 3);
        engine
            .add_constraint(Constraint::new([c(0, 0), c(0, 1)], 1))
            .unwrap();
        engine
            .add_constraint(Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 1))
            .unwrap();
        engine.mark_safe(c(0, 2)).unwrap();
        engine.infer().unwrap();

        assert_eq!(
            engine.knowledge(),
            &[Constraint::new([c(0, 0), c(0, 1)], 1)]
        );
    }

    #[test]
    fn test_add_constraint_folds_in_known_cells() {
        let mut engine = InferenceEngine::new(1, 3);
        engine.mark_mine(c(0, 0)).unwrap();
        engine.mark_safe(c(0, 1)).unwrap();

        engine
            .add_constraint(Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 1))
            .unwrap();
        assert_eq!(engine.knowledge(), &[Constraint::new([c(0, 2)], 0)]);
    }

    #[test]
    fn test_next_safe_move_skips_moves_made() {
        let mut engine = InferenceEngine::new(3, 3);
        assert_eq!(engine.next_safe_move(), None);

        engine.record_observation(c(0, 0), 0).unwrap();
        assert_eq!(engine.next_safe_move(), Some(c(0, 1)));

        engine.record_observation(c(0, 1), 0).unwrap();
        let next = engine.next_safe_move().unwrap();
        assert!(!engine.moves_made().contains(&next));
        assert!(engine.safes().contains(&next));
    }

    #[test]
    fn test_next_random_move_avoids_moves_and_mines() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut engine = InferenceEngine::new(2, 2);
        engine.record_observation(c(0, 0), 3).unwrap();
        // Every other cell is a known mine.
        assert_eq!(engine.next_random_move(&mut rng), None);

        let mut engine = InferenceEngine::new(2, 2);
        engine.mark_mine(c(1, 1)).unwrap();
        engine.record_observation(c(0, 0), 1).unwrap();
        for _ in 0..20 {
            let cell = engine.next_random_move(&mut rng).unwrap();
            assert!(cell == c(0, 1) || cell == c(1, 0));
        }
    }

    #[test]
    fn test_out_of_bounds_observation() {
        let mut engine = InferenceEngine::new(2, 2);
        assert_eq!(
            engine.record_observation(c(2, 0), 0),
            Err(InferenceError::OutOfBounds {
                cell: c(2, 0),
                height: 2,
                width: 2
            })
        );
        assert!(engine.moves_made().is_empty());
    }

    #[test]
    fn test_impossible_counts_are_rejected() {
        // Corner cell has only three neighbours.
        let mut engine = InferenceEngine::new(3, 3);
        let err = engine.record_observation(c(0, 0), 4).unwrap_err();
        assert!(matches!(err, InferenceError::InconsistentObservation { .. }));
        assert!(engine.safes().is_empty());

        // More known mines around the cell than the count allows.
        let mut engine = InferenceEngine::new(3, 3);
        engine.mark_mine(c(0, 1)).unwrap();
        engine.mark_mine(c(1, 0)).unwrap();
        let err = engine.record_observation(c(0, 0), 1).unwrap_err();
        assert_eq!(
            err,
            InferenceError::InconsistentObservation {
                cell: c(0, 0),
                count: 1,
                known_mines: 2,
                unresolved: 1
            }
        );
    }

    #[test]
    fn test_contradictory_facts() {
        let mut engine = InferenceEngine::new(2, 2);
        engine.mark_safe(c(0, 0)).unwrap();
        assert_eq!(
            engine.mark_mine(c(0, 0)),
            Err(InferenceError::Contradiction { cell: c(0, 0) })
        );

        // (0, 0) says none of its neighbours are mines, (1, 1) then claims three.
        let mut engine = InferenceEngine::new(2, 2);
        engine.record_observation(c(0, 0), 0).unwrap();
        assert!(engine.record_observation(c(1, 1), 3).is_err());
    }

    #[test]
    fn test_inconsistent_derivation() {
        let mut engine = InferenceEngine::new(1, 3);
        engine
            .add_constraint(Constraint::new([c(0, 0), c(0, 1)], 2))
            .unwrap();
        engine
            .add_constraint(Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 1))
            .unwrap();
        // The constraints are checked pairwise before any fact is applied.
        assert_eq!(
            engine.derive_subsets(),
            Err(InferenceError::InconsistentDerivation {
                subset: Constraint::new([c(0, 0), c(0, 1)], 2),
                superset: Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 1),
            })
        );
    }

    #[test]
    fn test_observing_known_mine_leaves_state_untouched() {
        let mut engine = InferenceEngine::new(3, 3);
        engine.mark_mine(c(0, 0)).unwrap();
        let before = engine.clone();

        assert_eq!(
            engine.record_observation(c(0, 0), 0),
            Err(InferenceError::Contradiction { cell: c(0, 0) })
        );
        assert!(engine.moves_made().is_empty());
        assert_eq!(engine, before);
    }

    #[test]
    fn test_marking_off_board_cells_is_rejected() {
        let mut engine = InferenceEngine::new(2, 3);
        let off_board = InferenceError::OutOfBounds {
            cell: c(0, 3),
            height: 2,
            width: 3,
        };
        assert_eq!(engine.mark_mine(c(0, 3)), Err(off_board.clone()));
        assert_eq!(engine.mark_safe(c(0, 3)), Err(off_board.clone()));
        assert_eq!(
            engine.add_constraint(Constraint::new([c(0, 2), c(0, 3)], 1)),
            Err(off_board)
        );
        assert!(engine.mines().is_empty());
        assert!(engine.safes().is_empty());
        assert!(engine.knowledge().is_empty());
    }

    #[test]
    fn test_loading_state_with_oversized_count_fails() {
        let mut engine = InferenceEngine::new(2, 2);
        engine
            .add_constraint(Constraint::new([c(0, 1)], 1))
            .unwrap();

        let mut state = serde_json::to_value(&engine).unwrap();
        state["knowledge"][0]["count"] = serde_json::json!(3);
        assert!(serde_json::from_value::<InferenceEngine>(state).is_err());

        let state = serde_json::to_value(&engine).unwrap();
        assert_eq!(
            serde_json::from_value::<InferenceEngine>(state).unwrap(),
            engine
        );
    }

    #[test]
    fn test_pass_limit() {
        let config = EngineConfig { max_passes: 1 };
        let mut engine = InferenceEngine::with_config(3, 3, config);
        assert_eq!(
            engine.record_observation(c(0, 0), 0),
            Err(InferenceError::PassLimitExceeded { limit: 1 })
        );
    }

    #[test]
    fn test_closure_steps_report_changes() {
        let mut engine = InferenceEngine::new(1, 3);
        engine
            .add_constraint(Constraint::new([c(0, 0)], 0))
            .unwrap();

        assert!(engine.apply_facts().unwrap());
        assert!(engine.safes().contains(&c(0, 0)));
        assert!(engine.remove_empty());
        assert!(!engine.derive_subsets().unwrap());
        assert!(!engine.apply_facts().unwrap());
        assert!(!engine.remove_empty());
    }
}
