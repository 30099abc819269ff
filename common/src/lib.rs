//! Logic behind the valentine "captcha" page.
//!
//! A tile captcha gates a response card with two controls; the decline
//! control jumps away whenever it is approached. The browser side only
//! renders and forwards events. Every decision lives here as plain functions
//! over explicit state, with the random source passed in so that tests can
//! seed it.

pub mod config;
pub mod engine;
pub mod error;
pub mod evasion;
pub mod flow;
pub mod geom;
pub mod puzzle;
pub mod selection;
pub mod tiles;

pub use config::Config;
pub use engine::{Puzzle, PuzzleKind};
pub use error::{ASSET_UNAVAILABLE_HINT, AssetError, PuzzleError};
pub use evasion::{EvasionPolicy, Layout, Placement, Placer, PointerTier, Trigger};
pub use flow::{ACCEPTED_MESSAGE, DragGesture, ResponseState, Screen, Session};
pub use geom::{Point, Rect, Size};
pub use puzzle::{GRID_SIZE, SwapOutcome, SwapPuzzle, TOTAL_CELLS};
pub use selection::{NUM_TARGETS, SelectionPuzzle, Toggle};
