//! Command-line interface: build a pool, render a mosaic, or dump a pool

use crate::color::clustering::KMeans;
use crate::color::signature::SignatureExtractor;
use crate::io::configuration::{
    DEFAULT_CANDIDATE_LIMIT, DEFAULT_CLUSTERS, DEFAULT_MATCH_TIMEOUT_MS, DEFAULT_MAX_USAGES,
    DEFAULT_POOL_NAME, DEFAULT_SEED, DEFAULT_THUMBNAIL_MAX, DEFAULT_TILE_HEIGHT,
    DEFAULT_TILE_WIDTH,
};
use crate::io::dump::dump_pool;
use crate::io::error::Result;
use crate::io::image::{default_output_path, load_target, save_canvas};
use crate::io::progress::ProgressManager;
use crate::mosaic::assembler::MosaicBuilder;
use crate::mosaic::matcher::MatchConfig;
use crate::mosaic::tiles::TileSize;
use crate::pool::build::PoolBuilder;
use crate::pool::store::ImagePool;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "photomosaic")]
#[command(
    author,
    version,
    about = "Rebuild an image as a mosaic of other images matched by color"
)]
/// Command-line arguments for the photomosaic tool
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Index a directory of candidate images into a pool store
    Build(BuildArgs),
    /// Render a mosaic of a target image from a pool store
    Render(RenderArgs),
    /// List every image and color row in a pool store
    Dump(DumpArgs),
}

/// Signature extraction settings shared by `build` and `render`
#[derive(Args, Clone, Copy)]
pub struct ExtractionArgs {
    /// Salient colors extracted per image
    #[arg(short = 'k', long, default_value_t = DEFAULT_CLUSTERS)]
    pub clusters: usize,

    /// Longest thumbnail side used for clustering
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_MAX)]
    pub thumbnail: u32,

    /// Seed for k-means initialisation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

impl ExtractionArgs {
    /// Construct the configured extractor
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster count or thumbnail size is zero
    pub fn extractor(self) -> Result<SignatureExtractor> {
        Ok(SignatureExtractor::new(self.clusters, self.thumbnail)?
            .with_clusterer(KMeans::new(self.seed)))
    }
}

/// Arguments for `build`
#[derive(Args)]
pub struct BuildArgs {
    /// Directory of candidate images, scanned recursively
    #[arg(value_name = "IMAGE_DIR")]
    pub image_dir: PathBuf,

    /// Pool store path (defaults to `<IMAGE_DIR>/imagepool.db`)
    #[arg(short, long)]
    pub pool: Option<PathBuf>,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub extraction: ExtractionArgs,
}

impl BuildArgs {
    /// Pool store this build writes into
    pub fn pool_path(&self) -> PathBuf {
        self.pool
            .clone()
            .unwrap_or_else(|| self.image_dir.join(DEFAULT_POOL_NAME))
    }
}

/// Arguments for `render`
#[derive(Args)]
pub struct RenderArgs {
    /// Image to reproduce as a mosaic
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Pool store produced by `build`
    #[arg(short, long)]
    pub pool: PathBuf,

    /// Output file (defaults to `<TARGET>_mosaic.png`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tile width in pixels
    #[arg(short = 'w', long, default_value_t = DEFAULT_TILE_WIDTH)]
    pub tile_width: u32,

    /// Tile height in pixels
    #[arg(short = 'H', long, default_value_t = DEFAULT_TILE_HEIGHT)]
    pub tile_height: u32,

    /// Times one pool image may be placed
    #[arg(short, long, default_value_t = DEFAULT_MAX_USAGES)]
    pub max_usages: u32,

    /// Nearest candidates considered per tile
    #[arg(short, long, default_value_t = DEFAULT_CANDIDATE_LIMIT)]
    pub candidates: usize,

    /// Time budget per tile query, in milliseconds
    #[arg(long, default_value_t = DEFAULT_MATCH_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub extraction: ExtractionArgs,
}

impl RenderArgs {
    /// Match limits requested on the command line
    pub const fn match_config(&self) -> MatchConfig {
        MatchConfig {
            max_usages: self.max_usages,
            candidate_limit: self.candidates,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    /// Where the mosaic is written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.target))
    }
}

/// Arguments for `dump`
#[derive(Args)]
pub struct DumpArgs {
    /// Pool store to list
    #[arg(value_name = "POOL")]
    pub pool: PathBuf,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Default log filter for this invocation
    pub const fn default_log_level(&self) -> &'static str {
        if self.quiet { "warn" } else { "info" }
    }
}

/// Dispatches a parsed [`Cli`] to the library
pub struct CommandRunner {
    cli: Cli,
    progress_manager: ProgressManager,
}

impl CommandRunner {
    /// Create a runner for the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = ProgressManager::new(cli.should_show_progress());
        Self {
            cli,
            progress_manager,
        }
    }

    /// Run the selected subcommand
    ///
    /// # Errors
    ///
    /// Returns an error if the pool store is unavailable, the target cannot
    /// be read, the pool is exhausted, or the output cannot be written
    pub fn run(&self) -> Result<()> {
        let result = match &self.cli.command {
            Command::Build(args) => self.build(args),
            Command::Render(args) => self.render(args),
            Command::Dump(args) => Self::dump(args),
        };
        self.progress_manager.finish();
        result
    }

    fn build(&self, args: &BuildArgs) -> Result<()> {
        let extractor = args.extraction.extractor()?;
        let pool = ImagePool::open(args.pool_path())?;
        let report = PoolBuilder::new(&pool, &extractor)
            .with_progress(self.progress_manager.phase("indexing", 0))
            .build_from_dir(&args.image_dir)?;
        info!(
            "Pool at {} now holds {} images ({} added)",
            args.pool_path().display(),
            pool.image_count()?,
            report.registered
        );
        Ok(())
    }

    fn render(&self, args: &RenderArgs) -> Result<()> {
        let tile = TileSize::new(args.tile_width, args.tile_height)?;
        let extractor = args.extraction.extractor()?;
        let target = load_target(&args.target)?;
        let pool = ImagePool::open_existing(&args.pool)?;

        let canvas = MosaicBuilder::new(&pool, &extractor, tile)
            .with_config(args.match_config())
            .with_progress(self.progress_manager.phase("tiles", 0))
            .photomosaic(&target)?;

        let output = args.output_path();
        save_canvas(&canvas, &output)?;
        info!("Wrote {}", output.display());
        Ok(())
    }

    fn dump(args: &DumpArgs) -> Result<()> {
        let pool = ImagePool::open_existing(&args.pool)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        dump_pool(&pool, &mut out)
    }
}
