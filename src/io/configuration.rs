//! Algorithm constants and runtime configuration defaults

// Signature extraction
/// Number of salient colors stored per pool image
pub const DEFAULT_CLUSTERS: usize = 4;
/// Longest side of the thumbnail used for clustering
pub const DEFAULT_THUMBNAIL_MAX: u32 = 100;

// Clustering
/// Fixed seed for reproducible k-means seeding
pub const DEFAULT_SEED: u64 = 42;
/// Upper bound on k-means iterations per clustering
pub const KMEANS_MAX_ITERATIONS: usize = 30;
/// Summed centroid shift (normalised sRGB) below which k-means stops early
pub const KMEANS_TOLERANCE: f32 = 1e-5;

// Matching
/// Times a single pool image may be placed during one run
pub const DEFAULT_MAX_USAGES: u32 = 5;
/// Number of nearest candidates kept after sorting by ab-distance
pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;
/// Per-tile time budget for a match query, in milliseconds
pub const DEFAULT_MATCH_TIMEOUT_MS: u64 = 5_000;

// Tiling
/// Default tile width in pixels
pub const DEFAULT_TILE_WIDTH: u32 = 20;
/// Default tile height in pixels
pub const DEFAULT_TILE_HEIGHT: u32 = 20;
// Safety limit to prevent excessive canvas allocation
/// Maximum allowed number of tiles along one axis
pub const MAX_GRID_DIMENSION: u32 = 10_000;

// Pool storage
/// File name of the pool store created inside an image directory
pub const DEFAULT_POOL_NAME: &str = "imagepool.db";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";
