use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use itertools::Itertools;
use tracing::debug;

use crate::error::AssetError;
use crate::puzzle::GRID_SIZE;

/// A square region of the source image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// The largest centered square of a `width` x `height` image.
pub fn crop_square(width: u32, height: u32) -> Option<CropRect> {
    let size = width.min(height);
    if size == 0 {
        return None;
    }
    Some(CropRect {
        x: (width - size) / 2,
        y: (height - size) / 2,
        size,
    })
}

/// Splits `crop` into `grid * grid` equal squares, row-major, so that entry
/// `i` is the fragment for tile id `i`. Remainder pixels are dropped.
pub fn tile_rects(crop: CropRect, grid: u32) -> Vec<CropRect> {
    let tile = crop.size / grid.max(1);
    (0..grid)
        .cartesian_product(0..grid)
        .map(|(row, col)| CropRect {
            x: crop.x + col * tile,
            y: crop.y + row * tile,
            size: tile,
        })
        .collect()
}

/// Decodes the puzzle photo and returns one PNG per tile, indexed by tile id.
pub fn slice_image(bytes: &[u8]) -> Result<Vec<Vec<u8>>, AssetError> {
    let img = image::load_from_memory(bytes).map_err(AssetError::Decode)?;
    slice_decoded(&img)
}

pub fn slice_decoded(img: &DynamicImage) -> Result<Vec<Vec<u8>>, AssetError> {
    let crop = crop_square(img.width(), img.height()).ok_or(AssetError::Empty)?;
    let rects = tile_rects(crop, GRID_SIZE as u32);
    if rects.first().is_some_and(|r| r.size == 0) {
        return Err(AssetError::Empty);
    }
    debug!(
        width = img.width(),
        height = img.height(),
        tile = rects[0].size,
        "slicing puzzle image"
    );
    rects
        .iter()
        .map(|r| {
            let fragment = img.crop_imm(r.x, r.y, r.size, r.size);
            let mut out = Cursor::new(Vec::new());
            fragment
                .write_to(&mut out, ImageFormat::Png)
                .map_err(AssetError::Encode)?;
            Ok(out.into_inner())
        })
        .collect()
}
