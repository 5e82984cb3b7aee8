//! Mosaic orchestration and final canvas composition

use crate::color::signature::SignatureExtractor;
use crate::io::configuration::MAX_GRID_DIMENSION;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{load_image, load_target};
use crate::mosaic::matcher::{MatchConfig, TileMatcher};
use crate::mosaic::tiles::{TileSize, crop_to_fit, partition};
use crate::pool::store::ImagePool;
use image::{RgbImage, imageops};
use indicatif::ProgressBar;
use log::info;
use ndarray::Array2;
use std::path::Path;

/// Paste a grid of finished tiles onto a fresh canvas
///
/// The canvas is `(cols * tile.width, rows * tile.height)`; tile `(row, col)`
/// lands at pixel offset `(col * tile.width, row * tile.height)` with no
/// blending. Tiles are expected to be exactly `tile` in size.
pub fn assemble(tiles: &Array2<RgbImage>, tile: TileSize) -> RgbImage {
    let (rows, cols) = tiles.dim();
    let mut canvas = RgbImage::new(cols as u32 * tile.width, rows as u32 * tile.height);
    for ((row, col), image) in tiles.indexed_iter() {
        let x = i64::from(col as u32 * tile.width);
        let y = i64::from(row as u32 * tile.height);
        imageops::replace(&mut canvas, image, x, y);
    }
    canvas
}

/// Runs the full partition, match, crop and assemble pipeline against a pool
pub struct MosaicBuilder<'a> {
    pool: &'a ImagePool,
    extractor: &'a SignatureExtractor,
    tile: TileSize,
    config: MatchConfig,
    progress: ProgressBar,
}

impl<'a> MosaicBuilder<'a> {
    /// Create a builder with default match limits
    pub fn new(pool: &'a ImagePool, extractor: &'a SignatureExtractor, tile: TileSize) -> Self {
        Self {
            pool,
            extractor,
            tile,
            config: MatchConfig::default(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Override the match limits
    #[must_use]
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Report per-tile progress on `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Rebuild `target` from pool images
    ///
    /// Usage counts are reset first, then tiles are matched in row-major
    /// order so later tiles see the usage of earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The target is smaller than one tile, or the grid is unreasonably large
    /// - The pool runs out of eligible images ([`MosaicError::PoolExhausted`]),
    ///   in which case the run stops at that tile
    /// - A tile query exceeds its time budget
    /// - A matched pool image can no longer be decoded
    /// - The pool store fails
    pub fn photomosaic(&self, target: &RgbImage) -> Result<RgbImage> {
        let (rows, cols) = self.tile.grid_dimensions(target.width(), target.height());
        if rows == 0 || cols == 0 {
            return Err(invalid_parameter(
                "target",
                &format!("{}x{}", target.width(), target.height()),
                &format!(
                    "smaller than one {}x{} tile",
                    self.tile.width, self.tile.height
                ),
            ));
        }
        if rows > MAX_GRID_DIMENSION || cols > MAX_GRID_DIMENSION {
            return Err(invalid_parameter(
                "tile_size",
                &format!("{}x{}", self.tile.width, self.tile.height),
                &format!("produces a {cols}x{rows} grid, limit is {MAX_GRID_DIMENSION}"),
            ));
        }
        self.config.validate()?;

        self.pool.reset_usage()?;
        let mut tiles = partition(target, self.tile);
        let matcher = TileMatcher::new(self.pool, self.extractor, self.config);

        self.progress.set_length(tiles.len() as u64);
        for ((row, col), tile) in tiles.indexed_iter_mut() {
            let found = matcher.find_match(tile).map_err(|err| match err {
                MosaicError::MatchTimeout { budget_ms, .. } => MosaicError::MatchTimeout {
                    tile: Some((row, col)),
                    budget_ms,
                },
                other => other,
            })?;
            let source = load_image(Path::new(&found.filename))?.to_rgb8();
            *tile = crop_to_fit(&source, self.tile);
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        info!("Assembled {cols}x{rows} tile mosaic");
        Ok(assemble(&tiles, self.tile))
    }
}

/// Build a mosaic of the image at `target_path` from the pool store at
/// `pool_path` with default extraction and match settings
///
/// # Errors
///
/// Returns [`MosaicError::StorageUnavailable`] if no pool store exists at
/// `pool_path`. Otherwise returns an error if the target cannot be decoded or
/// the mosaic run fails
pub fn photomosaic(target_path: &Path, tile: TileSize, pool_path: &Path) -> Result<RgbImage> {
    let target = load_target(target_path)?;
    let pool = ImagePool::open_existing(pool_path)?;
    let extractor = SignatureExtractor::default();
    MosaicBuilder::new(&pool, &extractor, tile).photomosaic(&target)
}
