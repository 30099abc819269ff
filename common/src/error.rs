/// Shown in the captcha status line when the tile image cannot be used.
pub const ASSET_UNAVAILABLE_HINT: &str = "Could not load image.";

/// Failures while constructing puzzle state from caller-provided data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    #[error("tile arrangement is not a permutation of 0..{expected}: {found:?}")]
    InvalidPermutation { expected: usize, found: Vec<u8> },
    #[error("target set must hold {expected} distinct cells below {cells}: {found:?}")]
    InvalidTargets {
        expected: usize,
        cells: usize,
        found: Vec<u8>,
    },
}

/// The tile image could not be decoded or re-encoded. There is no retry; the
/// caller surfaces [`ASSET_UNAVAILABLE_HINT`] and the round stays unplayable.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("tile encode failed: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image has no pixels")]
    Empty,
}

impl AssetError {
    pub fn hint(&self) -> &'static str {
        ASSET_UNAVAILABLE_HINT
    }
}
