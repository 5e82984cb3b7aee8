//! Tile geometry: grid partitioning and aspect-preserving crop-to-fit

use crate::io::error::{Result, invalid_parameter};
use image::{RgbImage, imageops, imageops::FilterType};
use ndarray::Array2;
use num_traits::ToPrimitive;

/// Size of one mosaic tile in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSize {
    /// Tile width
    pub width: u32,
    /// Tile height
    pub height: u32,
}

impl TileSize {
    /// Create a tile size
    ///
    /// # Errors
    ///
    /// Returns an error if either side is zero
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(invalid_parameter(
                "tile_size",
                &format!("{width}x{height}"),
                &"both sides must be at least one pixel",
            ));
        }
        Ok(Self { width, height })
    }

    /// Width divided by height
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Number of (rows, cols) of whole tiles that fit in a `width` x `height` image
    pub const fn grid_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        (height / self.height, width / self.width)
    }
}

/// Pixel rectangle `(x, y, width, height)` inside a source image
pub type CropWindow = (u32, u32, u32, u32);

/// Split `target` into a row-major grid of whole tiles
///
/// Grid shape is `(height / tile.height, width / tile.width)`; any strip on
/// the right or bottom narrower than a full tile is discarded.
pub fn partition(target: &RgbImage, tile: TileSize) -> Array2<RgbImage> {
    let (rows, cols) = tile.grid_dimensions(target.width(), target.height());
    Array2::from_shape_fn((rows as usize, cols as usize), |(row, col)| {
        imageops::crop_imm(
            target,
            col as u32 * tile.width,
            row as u32 * tile.height,
            tile.width,
            tile.height,
        )
        .to_image()
    })
}

/// Largest centered window of `width` x `height` with the tile's aspect ratio
///
/// Aspect ratios are compared in floating point so near-square tiles are
/// classified correctly. The window only ever shrinks the axis that has
/// excess.
pub fn crop_window(width: u32, height: u32, tile: TileSize) -> CropWindow {
    let tile_aspect = tile.aspect();
    let image_aspect = f64::from(width) / f64::from(height.max(1));

    if image_aspect > tile_aspect {
        let crop_width = (f64::from(height) * tile_aspect)
            .round()
            .to_u32()
            .unwrap_or(width)
            .clamp(1, width.max(1));
        (width.saturating_sub(crop_width) / 2, 0, crop_width, height)
    } else {
        let crop_height = (f64::from(width) / tile_aspect)
            .round()
            .to_u32()
            .unwrap_or(height)
            .clamp(1, height.max(1));
        (0, height.saturating_sub(crop_height) / 2, width, crop_height)
    }
}

/// Center-crop `image` to the tile's aspect ratio, then resample it to
/// exactly the tile size with a Lanczos filter
pub fn crop_to_fit(image: &RgbImage, tile: TileSize) -> RgbImage {
    let (x, y, width, height) = crop_window(image.width(), image.height(), tile);
    let cropped = imageops::crop_imm(image, x, y, width, height).to_image();
    if cropped.dimensions() == (tile.width, tile.height) {
        return cropped;
    }
    imageops::resize(&cropped, tile.width, tile.height, FilterType::Lanczos3)
}
