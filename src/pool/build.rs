//! Offline pool construction from a directory of candidate images
//!
//! Decoding and signature extraction run in parallel; registration happens on
//! the calling thread in path order so duplicate filenames are resolved
//! deterministically by the store's uniqueness constraint.

use crate::color::signature::{SalientColor, SignatureExtractor};
use crate::io::error::{MosaicError, Result};
use crate::io::image::load_image;
use crate::pool::store::ImagePool;
use indicatif::ProgressBar;
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome counts of a pool build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Images newly written to the pool
    pub registered: usize,
    /// Files skipped because their filename was already registered
    pub duplicates: usize,
    /// Files that could not be decoded as images
    pub unreadable: usize,
    /// Images skipped for not being three-channel RGB
    pub unsupported: usize,
}

impl BuildReport {
    /// Total number of files examined
    pub const fn scanned(&self) -> usize {
        self.registered + self.duplicates + self.unreadable + self.unsupported
    }

    /// Count a skipped file under the counter matching `err`
    ///
    /// Errors that are not skippable leave the report unchanged.
    pub const fn record_skip(&mut self, err: &MosaicError) {
        match err {
            MosaicError::DuplicateImage { .. } => self.duplicates += 1,
            MosaicError::UnreadableFile { .. } => self.unreadable += 1,
            MosaicError::UnsupportedFormat { .. } => self.unsupported += 1,
            _ => {}
        }
    }
}

/// Signature of one decoded candidate, ready for registration
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzedImage {
    /// Filename under which the image is registered
    pub filename: String,
    /// Width of the full-size image
    pub width: u32,
    /// Height of the full-size image
    pub height: u32,
    /// Abundance-ranked salient colors
    pub signature: Vec<SalientColor>,
}

/// Recursively list every regular file under `root`, sorted by path
///
/// Entries that cannot be read are logged and skipped.
pub fn walk_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable directory entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Decode `path` and extract its signature
///
/// # Errors
///
/// Returns [`MosaicError::UnreadableFile`] if the file does not decode, or
/// [`MosaicError::UnsupportedFormat`] if it is not three-channel RGB
pub fn analyze_file(path: &Path, extractor: &SignatureExtractor) -> Result<AnalyzedImage> {
    let image = load_image(path)?;
    let signature = extractor.extract(&image).map_err(|err| match err {
        MosaicError::UnsupportedFormat { color_type, .. } => MosaicError::UnsupportedFormat {
            path: Some(path.to_path_buf()),
            color_type,
        },
        other => other,
    })?;
    Ok(AnalyzedImage {
        filename: path.to_string_lossy().into_owned(),
        width: image.width(),
        height: image.height(),
        signature,
    })
}

/// Indexes candidate images into an [`ImagePool`]
pub struct PoolBuilder<'a> {
    pool: &'a ImagePool,
    extractor: &'a SignatureExtractor,
    progress: ProgressBar,
}

impl<'a> PoolBuilder<'a> {
    /// Create a builder writing into `pool`
    pub fn new(pool: &'a ImagePool, extractor: &'a SignatureExtractor) -> Self {
        Self {
            pool,
            extractor,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report per-file progress on `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Register every file under `root`
    ///
    /// The pool store itself is never registered.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures; unreadable, non-RGB and
    /// duplicate files are logged and counted in the report
    pub fn build_from_dir<P: AsRef<Path>>(&self, root: P) -> Result<BuildReport> {
        let own_store = self.pool.path().map(Path::to_path_buf);
        let files: Vec<PathBuf> = walk_files(root)
            .into_iter()
            .filter(|path| !is_store_file(path, own_store.as_deref()))
            .collect();
        self.build(&files)
    }

    /// Register each of `paths`
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures; unreadable, non-RGB and
    /// duplicate files are logged and counted in the report
    pub fn build(&self, paths: &[PathBuf]) -> Result<BuildReport> {
        self.progress.set_length(paths.len() as u64);

        let analyzed: Vec<Result<AnalyzedImage>> = paths
            .par_iter()
            .map(|path| {
                let result = analyze_file(path, self.extractor);
                self.progress.inc(1);
                result
            })
            .collect();

        let mut report = BuildReport::default();
        for result in analyzed {
            let outcome = result.and_then(|image| {
                self.pool
                    .register(&image.filename, image.width, image.height, &image.signature)
            });
            match outcome {
                Ok(_) => report.registered += 1,
                Err(err) if err.is_skippable() => {
                    warn!("{err}. Skipping it.");
                    report.record_skip(&err);
                }
                Err(err) => return Err(err),
            }
        }

        self.progress.finish_and_clear();
        info!(
            "Pool build scanned {} files: {} registered, {} duplicates, {} unreadable, {} not RGB",
            report.scanned(),
            report.registered,
            report.duplicates,
            report.unreadable,
            report.unsupported
        );
        Ok(report)
    }
}

fn is_store_file(path: &Path, store: Option<&Path>) -> bool {
    let Some(store) = store else {
        return false;
    };
    let matches_store = |candidate: &Path| {
        candidate == store
            || candidate
                .canonicalize()
                .ok()
                .zip(store.canonicalize().ok())
                .is_some_and(|(a, b)| a == b)
    };
    // SQLite keeps WAL and shared-memory files next to the store
    let name = path.to_string_lossy();
    let base = name
        .strip_suffix("-wal")
        .or_else(|| name.strip_suffix("-shm"))
        .or_else(|| name.strip_suffix("-journal"))
        .unwrap_or(&name);
    matches_store(Path::new(base))
}

/// Build (or extend) a pool store named `pool_name` inside `image_dir` from
/// every file in that directory tree
///
/// # Errors
///
/// Returns [`MosaicError::StorageUnavailable`] if the store cannot be opened,
/// or [`MosaicError::Storage`] if a write fails
pub fn create_image_pool<P: AsRef<Path>>(
    image_dir: P,
    pool_name: &str,
    extractor: &SignatureExtractor,
) -> Result<BuildReport> {
    let image_dir = image_dir.as_ref();
    let pool = ImagePool::open(image_dir.join(pool_name))?;
    PoolBuilder::new(&pool, extractor).build_from_dir(image_dir)
}
