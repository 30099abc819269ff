use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::puzzle::SwapPuzzle;
use crate::selection::SelectionPuzzle;

/// Which captcha the first screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum PuzzleKind {
    /// 3x3 image tiles, swapped by drag until the picture is whole.
    #[default]
    Swap,
    /// Pick the hearts hidden among decoys.
    Select,
}

impl fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleKind::Swap => f.write_str("swap"),
            PuzzleKind::Select => f.write_str("select"),
        }
    }
}

impl FromStr for PuzzleKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "swap" => Ok(PuzzleKind::Swap),
            "select" => Ok(PuzzleKind::Select),
            other => anyhow::bail!("unknown puzzle kind: {other}"),
        }
    }
}

/// A captcha of either kind behind one interface for the screen controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Puzzle {
    Swap(SwapPuzzle),
    Select(SelectionPuzzle),
}

impl Puzzle {
    pub fn generate<R: Rng + ?Sized>(kind: PuzzleKind, rng: &mut R) -> Self {
        match kind {
            PuzzleKind::Swap => Puzzle::Swap(SwapPuzzle::generate(rng)),
            PuzzleKind::Select => Puzzle::Select(SelectionPuzzle::generate(rng)),
        }
    }

    pub fn kind(&self) -> PuzzleKind {
        match self {
            Puzzle::Swap(_) => PuzzleKind::Swap,
            Puzzle::Select(_) => PuzzleKind::Select,
        }
    }

    pub fn is_solved(&self) -> bool {
        match self {
            Puzzle::Swap(p) => p.is_solved(),
            Puzzle::Select(p) => p.is_solved(),
        }
    }

    /// Status line shown under the grid.
    pub fn hint(&self) -> &'static str {
        match self {
            Puzzle::Swap(p) => p.hint(),
            Puzzle::Select(p) => p.hint(),
        }
    }
}

impl From<SwapPuzzle> for Puzzle {
    fn from(p: SwapPuzzle) -> Self {
        Puzzle::Swap(p)
    }
}

impl From<SelectionPuzzle> for Puzzle {
    fn from(p: SelectionPuzzle) -> Self {
        Puzzle::Select(p)
    }
}
