//! Photomosaic generation from a persistent, color-indexed image pool
//!
//! Candidate images are reduced to a handful of abundance-ranked salient
//! colors and stored in a SQLite pool. A target image is cut into a grid of
//! tiles; each tile is replaced by the pool image whose salient color lies
//! closest in the Lab chroma plane, subject to a per-image usage cap that
//! keeps the mosaic varied.

#![forbid(unsafe_code)]

/// Lab conversion, clustering and color signature extraction
pub mod color;
/// Input/output operations and error handling
pub mod io;
/// Tile partitioning, matching and assembly
pub mod mosaic;
/// Persistent image pool with usage tracking
pub mod pool;

pub use io::error::{MosaicError, Result};
