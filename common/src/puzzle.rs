use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::error::PuzzleError;

/// Side length of the captcha grid.
pub const GRID_SIZE: usize = 3;
/// Number of cells (and tiles) in the grid.
pub const TOTAL_CELLS: usize = GRID_SIZE * GRID_SIZE;

pub const SWAP_INSTRUCTION_HINT: &str = "Drag a tile onto another to swap them";
pub const SOLVED_HINT: &str = "Puzzle complete!";

/// The image-tile variant of the captcha: `tiles[position] = tile id`.
///
/// The arrangement is always a permutation of `0..TOTAL_CELLS` and only ever
/// changes through [`SwapPuzzle::attempt_swap`]. Once every tile sits in its
/// home cell the puzzle freezes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SwapPuzzle {
    tiles: Vec<u8>,
    moves: u32,
    solved: bool,
}

/// What a swap request did to the puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Tiles were exchanged and the puzzle is still unsolved.
    Swapped,
    /// Tiles were exchanged and this swap completed the picture.
    Solved,
    /// Nothing changed: same cell, out-of-range cell, or already solved.
    Ignored,
}

impl SwapPuzzle {
    /// Shuffles the identity arrangement, reshuffling until it is not already solved.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut tiles: Vec<u8> = (0..TOTAL_CELLS as u8).collect();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            tiles.shuffle(rng);
            if !is_sorted(&tiles) {
                break;
            }
        }
        debug!(?tiles, attempts, "generated swap puzzle");
        SwapPuzzle {
            tiles,
            moves: 0,
            solved: false,
        }
    }

    /// Builds a puzzle from an explicit arrangement.
    pub fn from_tiles(tiles: Vec<u8>) -> Result<Self, PuzzleError> {
        if !is_permutation(&tiles) {
            return Err(PuzzleError::InvalidPermutation {
                expected: TOTAL_CELLS,
                found: tiles,
            });
        }
        let solved = is_sorted(&tiles);
        Ok(SwapPuzzle {
            tiles,
            moves: 0,
            solved,
        })
    }

    /// Deserializes a puzzle from bytes, rejecting arrangements that break the permutation invariant.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        let mut puzzle: SwapPuzzle = bcs::from_bytes(bts)?;
        if !is_permutation(&puzzle.tiles) {
            anyhow::bail!("corrupt_tiles");
        }
        // The flag is derived state; never trust it from the wire.
        puzzle.solved = is_sorted(&puzzle.tiles);
        Ok(puzzle)
    }

    /// Serializes the puzzle to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Exchanges the tiles at `a` and `b` and counts the move.
    ///
    /// Self-swaps, out-of-range cells and any swap after the puzzle is solved
    /// leave both the arrangement and the move counter untouched.
    pub fn attempt_swap(&mut self, a: usize, b: usize) -> SwapOutcome {
        if self.solved || a == b || a >= TOTAL_CELLS || b >= TOTAL_CELLS {
            return SwapOutcome::Ignored;
        }
        self.tiles.swap(a, b);
        self.moves += 1;
        self.solved = is_sorted(&self.tiles);
        debug!(a, b, moves = self.moves, solved = self.solved, "swapped tiles");
        if self.solved {
            SwapOutcome::Solved
        } else {
            SwapOutcome::Swapped
        }
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Whether the tile at `pos` is already in its home cell.
    pub fn is_correct(&self, pos: usize) -> bool {
        self.tiles.get(pos).is_some_and(|&id| id as usize == pos)
    }

    /// Tiles can be dragged only while the puzzle is unsolved.
    pub fn is_draggable(&self) -> bool {
        !self.solved
    }

    pub fn hint(&self) -> &'static str {
        if self.solved {
            SOLVED_HINT
        } else {
            SWAP_INSTRUCTION_HINT
        }
    }
}

/// True when every position holds its own index.
pub fn is_sorted(tiles: &[u8]) -> bool {
    tiles.iter().enumerate().all(|(i, &id)| id as usize == i)
}

fn is_permutation(tiles: &[u8]) -> bool {
    if tiles.len() != TOTAL_CELLS {
        return false;
    }
    let mut seen = [false; TOTAL_CELLS];
    for &id in tiles {
        match seen.get_mut(id as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_puzzle_never_starts_solved() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let puzzle = SwapPuzzle::generate(&mut rng);
            assert!(!puzzle.is_solved());
            assert!(!is_sorted(puzzle.tiles()));
            assert!(is_permutation(puzzle.tiles()));
            assert_eq!(puzzle.moves(), 0);
        }
    }

    #[test]
    fn test_two_swaps_solve_puzzle() {
        let mut puzzle = SwapPuzzle::from_tiles(vec![2, 0, 1, 3, 4, 5, 6, 7, 8]).unwrap();

        assert_eq!(puzzle.attempt_swap(0, 1), SwapOutcome::Swapped);
        assert_eq!(puzzle.tiles(), &[0, 2, 1, 3, 4, 5, 6, 7, 8]);
        assert!(!puzzle.is_solved());

        assert_eq!(puzzle.attempt_swap(1, 2), SwapOutcome::Solved);
        assert_eq!(puzzle.tiles(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.moves(), 2);
        assert!(!puzzle.is_draggable());
        assert_eq!(puzzle.hint(), SOLVED_HINT);
    }

    #[test]
    fn test_self_swap_is_ignored() {
        let mut puzzle = SwapPuzzle::from_tiles(vec![1, 0, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(puzzle.attempt_swap(4, 4), SwapOutcome::Ignored);
        assert_eq!(puzzle.attempt_swap(0, TOTAL_CELLS), SwapOutcome::Ignored);
        assert_eq!(puzzle.tiles(), &[1, 0, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(puzzle.moves(), 0);
    }

    #[test]
    fn test_swaps_after_solved_are_frozen() {
        let mut puzzle = SwapPuzzle::from_tiles(vec![1, 0, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(puzzle.attempt_swap(0, 1), SwapOutcome::Solved);
        assert_eq!(puzzle.attempt_swap(3, 4), SwapOutcome::Ignored);
        assert_eq!(puzzle.tiles(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(puzzle.moves(), 1);
    }

    #[test]
    fn test_from_tiles_rejects_non_permutations() {
        assert!(SwapPuzzle::from_tiles(vec![0, 0, 2, 3, 4, 5, 6, 7, 8]).is_err());
        assert!(SwapPuzzle::from_tiles(vec![0, 1, 2]).is_err());
        assert!(SwapPuzzle::from_tiles(vec![0, 1, 2, 3, 4, 5, 6, 7, 9]).is_err());
    }

    #[test]
    fn test_correct_cells() {
        let puzzle = SwapPuzzle::from_tiles(vec![0, 2, 1, 3, 4, 5, 6, 8, 7]).unwrap();
        let correct: Vec<usize> = (0..TOTAL_CELLS).filter(|&p| puzzle.is_correct(p)).collect();
        assert_eq!(correct, vec![0, 3, 4, 5, 6]);
    }

    #[test]
    fn test_serialization_preserves_progress() {
        let mut puzzle = SwapPuzzle::from_tiles(vec![2, 0, 1, 3, 4, 5, 6, 7, 8]).unwrap();
        puzzle.attempt_swap(0, 1);
        let bts = puzzle.serialize().unwrap();
        let restored = SwapPuzzle::deserialize(&bts).unwrap();
        assert_eq!(restored, puzzle);
        assert!(SwapPuzzle::deserialize(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_deserialize_recomputes_solved_flag() {
        let stale = SwapPuzzle {
            tiles: (0..TOTAL_CELLS as u8).collect(),
            moves: 4,
            solved: false,
        };
        let mut restored = SwapPuzzle::deserialize(&stale.serialize().unwrap()).unwrap();
        assert!(restored.is_solved());
        assert_eq!(restored.attempt_swap(0, 1), SwapOutcome::Ignored);
        assert_eq!(restored.moves(), 4);
    }

    proptest! {
        #[test]
        fn prop_solved_iff_identity(ops in proptest::collection::vec((0..TOTAL_CELLS, 0..TOTAL_CELLS), 0..40)) {
            let mut puzzle = SwapPuzzle::from_tiles(vec![8, 7, 6, 5, 4, 3, 2, 1, 0]).unwrap();
            for (a, b) in ops {
                let before = puzzle.clone();
                let outcome = puzzle.attempt_swap(a, b);
                if before.is_solved() || a == b {
                    prop_assert_eq!(outcome, SwapOutcome::Ignored);
                    prop_assert_eq!(&puzzle, &before);
                } else {
                    prop_assert_eq!(puzzle.moves(), before.moves() + 1);
                }
                prop_assert!(is_permutation(puzzle.tiles()));
                prop_assert_eq!(puzzle.is_solved(), is_sorted(puzzle.tiles()));
            }
        }
    }
}
