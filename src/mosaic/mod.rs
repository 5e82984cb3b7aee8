//! Target partitioning, tile matching and canvas assembly

/// Canvas composition and the end-to-end mosaic pipeline
pub mod assembler;
/// Usage-capped nearest-color matching against the pool
pub mod matcher;
/// Tile grid partitioning and crop-to-fit resampling
pub mod tiles;

pub use assembler::{MosaicBuilder, assemble, photomosaic};
pub use matcher::{Match, MatchConfig, TileMatcher};
pub use tiles::{TileSize, crop_to_fit, partition};
