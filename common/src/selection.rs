use std::collections::BTreeSet;

use rand::Rng;
use tracing::debug;

use crate::error::PuzzleError;
use crate::puzzle::{SOLVED_HINT, TOTAL_CELLS};

/// How many heart cells are hidden among the decoys each round.
pub const NUM_TARGETS: usize = 3;

pub const SELECT_INSTRUCTION_HINT: &str = "Select all the hearts, then press verify";
pub const NOT_A_HEART_HINT: &str = "That one isn't a heart. Try again!";

/// The "select the hearts" variant of the captcha.
///
/// `targets` is fixed for the round. `selected` only ever contains target
/// cells, because toggling a decoy is refused.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SelectionPuzzle {
    targets: BTreeSet<u8>,
    selected: BTreeSet<u8>,
}

/// Result of toggling a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Deselected,
    /// The cell is a decoy (or off the grid); nothing changed.
    Rejected { hint: &'static str },
}

impl SelectionPuzzle {
    /// Picks `NUM_TARGETS` distinct cells out of `TOTAL_CELLS`, uniformly.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let targets: BTreeSet<u8> = rand::seq::index::sample(rng, TOTAL_CELLS, NUM_TARGETS)
            .into_iter()
            .map(|i| i as u8)
            .collect();
        debug!(?targets, "generated selection puzzle");
        SelectionPuzzle {
            targets,
            selected: BTreeSet::new(),
        }
    }

    pub fn with_targets(targets: impl IntoIterator<Item = u8>) -> Result<Self, PuzzleError> {
        let found: Vec<u8> = targets.into_iter().collect();
        let set: BTreeSet<u8> = found.iter().copied().collect();
        if set.len() != NUM_TARGETS
            || found.len() != NUM_TARGETS
            || set.iter().any(|&t| t as usize >= TOTAL_CELLS)
        {
            return Err(PuzzleError::InvalidTargets {
                expected: NUM_TARGETS,
                cells: TOTAL_CELLS,
                found,
            });
        }
        Ok(SelectionPuzzle {
            targets: set,
            selected: BTreeSet::new(),
        })
    }

    /// Starts a fresh round with an independently drawn target set.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = Self::generate(rng);
    }

    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        let puzzle: SelectionPuzzle = bcs::from_bytes(bts)?;
        if puzzle.targets.len() != NUM_TARGETS
            || puzzle.targets.iter().any(|&t| t as usize >= TOTAL_CELLS)
            || !puzzle.selected.is_subset(&puzzle.targets)
        {
            anyhow::bail!("corrupt_selection");
        }
        Ok(puzzle)
    }

    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Flips the selection of a heart cell. Decoys are refused with a hint.
    pub fn toggle(&mut self, pos: usize) -> Toggle {
        if !self.is_target(pos) {
            debug!(pos, "rejected decoy toggle");
            return Toggle::Rejected {
                hint: NOT_A_HEART_HINT,
            };
        }
        let cell = pos as u8;
        if self.selected.remove(&cell) {
            debug!(pos, "deselected heart");
            Toggle::Deselected
        } else {
            self.selected.insert(cell);
            debug!(pos, selected = self.selected.len(), "selected heart");
            Toggle::Selected
        }
    }

    pub fn is_target(&self, pos: usize) -> bool {
        pos < TOTAL_CELLS && self.targets.contains(&(pos as u8))
    }

    pub fn is_selected(&self, pos: usize) -> bool {
        pos < TOTAL_CELLS && self.selected.contains(&(pos as u8))
    }

    pub fn is_solved(&self) -> bool {
        self.selected.is_superset(&self.targets)
    }

    /// Gate check for the verify button. Never mutates state.
    pub fn verify(&self) -> bool {
        self.is_solved()
    }

    pub fn targets(&self) -> &BTreeSet<u8> {
        &self.targets
    }

    pub fn selected(&self) -> &BTreeSet<u8> {
        &self.selected
    }

    pub fn hint(&self) -> &'static str {
        if self.is_solved() {
            SOLVED_HINT
        } else {
            SELECT_INSTRUCTION_HINT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_toggle_sequence_solves() {
        let mut puzzle = SelectionPuzzle::with_targets([1, 4, 7]).unwrap();

        assert_eq!(puzzle.toggle(1), Toggle::Selected);
        assert_eq!(puzzle.selected(), &BTreeSet::from([1]));
        assert!(!puzzle.is_solved());

        assert_eq!(
            puzzle.toggle(2),
            Toggle::Rejected {
                hint: NOT_A_HEART_HINT
            }
        );
        assert_eq!(puzzle.selected(), &BTreeSet::from([1]));

        assert_eq!(puzzle.toggle(4), Toggle::Selected);
        assert!(!puzzle.verify());

        assert_eq!(puzzle.toggle(7), Toggle::Selected);
        assert_eq!(puzzle.selected(), &BTreeSet::from([1, 4, 7]));
        assert!(puzzle.is_solved());
        assert!(puzzle.verify());
        assert_eq!(puzzle.hint(), SOLVED_HINT);

        assert!(matches!(puzzle.toggle(2), Toggle::Rejected { .. }));
        assert_eq!(puzzle.selected().len(), 3);
    }

    #[test]
    fn test_deselect_unsolves() {
        let mut puzzle = SelectionPuzzle::with_targets([0, 5, 8]).unwrap();
        for pos in [0, 5, 8] {
            puzzle.toggle(pos);
        }
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.toggle(5), Toggle::Deselected);
        assert!(!puzzle.is_solved());
        assert!(!puzzle.is_selected(5));
    }

    #[test]
    fn test_generated_targets_are_three_distinct_cells() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut distinct_rounds = BTreeSet::new();
        for _ in 0..200 {
            let puzzle = SelectionPuzzle::generate(&mut rng);
            assert_eq!(puzzle.targets().len(), NUM_TARGETS);
            assert!(puzzle.targets().iter().all(|&t| (t as usize) < TOTAL_CELLS));
            assert!(puzzle.selected().is_empty());
            distinct_rounds.insert(puzzle.targets().clone());
        }
        // 84 possible target sets; 200 rounds should not keep repeating one.
        assert!(distinct_rounds.len() > 10);
    }

    #[test]
    fn test_reset_clears_selection() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut puzzle = SelectionPuzzle::with_targets([2, 3, 6]).unwrap();
        puzzle.toggle(2);
        puzzle.reset(&mut rng);
        assert!(puzzle.selected().is_empty());
        assert_eq!(puzzle.targets().len(), NUM_TARGETS);
    }

    #[test]
    fn test_with_targets_validation() {
        assert!(SelectionPuzzle::with_targets([1, 1, 2]).is_err());
        assert!(SelectionPuzzle::with_targets([1, 2]).is_err());
        assert!(SelectionPuzzle::with_targets([1, 2, 9]).is_err());
        assert!(SelectionPuzzle::with_targets([1, 2, 3, 4]).is_err());
    }

    #[test]
    fn test_serialization_roundtrip_keeps_selection() {
        let mut puzzle = SelectionPuzzle::with_targets([1, 4, 7]).unwrap();
        puzzle.toggle(4);
        let restored = SelectionPuzzle::deserialize(&puzzle.serialize().unwrap()).unwrap();
        assert_eq!(restored, puzzle);
    }

    #[test]
    fn test_deserialize_rejects_off_grid_targets() {
        let off_grid = SelectionPuzzle {
            targets: BTreeSet::from([1, 4, 9]),
            selected: BTreeSet::new(),
        };
        assert!(SelectionPuzzle::deserialize(&off_grid.serialize().unwrap()).is_err());

        let stray = SelectionPuzzle {
            targets: BTreeSet::from([1, 4, 7]),
            selected: BTreeSet::from([2]),
        };
        assert!(SelectionPuzzle::deserialize(&stray.serialize().unwrap()).is_err());
    }

    proptest! {
        #[test]
        fn prop_toggle_only_flips_targets(seed in any::<u64>(), cells in proptest::collection::vec(0..TOTAL_CELLS, 0..30)) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut puzzle = SelectionPuzzle::generate(&mut rng);
            for pos in cells {
                let before = puzzle.selected().len();
                let was_selected = puzzle.is_selected(pos);
                match puzzle.toggle(pos) {
                    Toggle::Rejected { .. } => {
                        prop_assert!(!puzzle.is_target(pos));
                        prop_assert_eq!(puzzle.selected().len(), before);
                    }
                    Toggle::Selected => {
                        prop_assert!(!was_selected);
                        prop_assert_eq!(puzzle.selected().len(), before + 1);
                    }
                    Toggle::Deselected => {
                        prop_assert!(was_selected);
                        prop_assert_eq!(puzzle.selected().len(), before - 1);
                    }
                }
                prop_assert!(puzzle.selected().is_subset(puzzle.targets()));
                prop_assert_eq!(puzzle.is_solved(), puzzle.selected() == puzzle.targets());
            }
        }
    }
}
