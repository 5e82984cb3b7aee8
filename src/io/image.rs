//! Image decode and encode boundaries

use crate::io::configuration::OUTPUT_SUFFIX;
use crate::io::error::{MosaicError, Result};
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};

/// Decode an image file, keeping its native color layout
///
/// # Errors
///
/// Returns [`MosaicError::UnreadableFile`] if the file cannot be opened or
/// decoded
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| MosaicError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode a mosaic target and normalise it to 8-bit RGB
///
/// # Errors
///
/// Returns [`MosaicError::UnreadableFile`] if the file cannot be opened or
/// decoded
pub fn load_target(path: &Path) -> Result<RgbImage> {
    load_image(path).map(|image| image.to_rgb8())
}

/// Write the assembled canvas, creating parent directories as needed
///
/// The encoding is chosen from the file extension.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written
pub fn save_canvas(canvas: &RgbImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }
    }

    canvas
        .save(output_path)
        .map_err(|e| MosaicError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })
}

/// Default output location next to the target, e.g. `cat.jpg` -> `cat_mosaic.png`
pub fn default_output_path(target: &Path) -> PathBuf {
    let stem = target.file_stem().unwrap_or_default();
    let output_name = format!("{}{OUTPUT_SUFFIX}.png", stem.to_string_lossy());

    if let Some(parent) = target.parent() {
        parent.join(output_name)
    } else {
        PathBuf::from(output_name)
    }
}
