//! Error taxonomy for signature extraction, pool storage and mosaic assembly

use std::fmt;
use std::path::PathBuf;

/// Main error type for all photomosaic operations
#[derive(Debug)]
pub enum MosaicError {
    /// Signature extraction was given an image that is not three-channel RGB
    UnsupportedFormat {
        /// Source of the image, when known
        path: Option<PathBuf>,
        /// Color layout that was found instead
        color_type: String,
    },

    /// Image file could not be opened or decoded
    UnreadableFile {
        /// Path to the image file
        path: PathBuf,
        /// Underlying decode error
        source: image::ImageError,
    },

    /// Filename is already registered in the pool
    ///
    /// Recovered locally by the pool builder; the pool is left unchanged.
    DuplicateImage {
        /// Filename that collided with an existing row
        filename: String,
    },

    /// No signature entry satisfies the usage cap
    ///
    /// Fatal to the current run. Callers may retry with a relaxed cap.
    PoolExhausted {
        /// Usage cap in force when the query ran
        max_usages: u32,
    },

    /// Pool store could not be opened or created
    StorageUnavailable {
        /// Path of the pool store
        path: PathBuf,
        /// Underlying SQLite error
        source: rusqlite::Error,
    },

    /// A query or write against an open pool store failed
    Storage {
        /// Pool operation that was running
        operation: &'static str,
        /// Underlying SQLite error
        source: rusqlite::Error,
    },

    /// A single tile match ran past its time budget
    MatchTimeout {
        /// Grid position (row, col) of the tile, when known
        tile: Option<(usize, usize)>,
        /// Budget that was exceeded, in milliseconds
        budget_ms: u128,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to save the assembled canvas
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { path, color_type } => match path {
                Some(path) => write!(
                    f,
                    "Unsupported color format {color_type} in '{}': RGB images only",
                    path.display()
                ),
                None => write!(f, "Unsupported color format {color_type}: RGB images only"),
            },
            Self::UnreadableFile { path, source } => {
                write!(f, "Cannot open '{}' as an image: {source}", path.display())
            }
            Self::DuplicateImage { filename } => {
                write!(f, "Image '{filename}' is already in the pool")
            }
            Self::PoolExhausted { max_usages } => {
                write!(
                    f,
                    "Image pool exhausted: every image has been used {max_usages} times"
                )
            }
            Self::StorageUnavailable { path, source } => {
                write!(
                    f,
                    "Cannot open pool store at '{}': {source}",
                    path.display()
                )
            }
            Self::Storage { operation, source } => {
                write!(f, "Pool store error during {operation}: {source}")
            }
            Self::MatchTimeout { tile, budget_ms } => match tile {
                Some((row, col)) => write!(
                    f,
                    "Match for tile ({row}, {col}) exceeded its {budget_ms}ms budget"
                ),
                None => write!(f, "Match exceeded its {budget_ms}ms budget"),
            },
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnreadableFile { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::StorageUnavailable { source, .. } | Self::Storage { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for photomosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

impl MosaicError {
    /// Whether the pool builder may skip the offending file and keep scanning
    pub const fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::UnreadableFile { .. } | Self::DuplicateImage { .. }
        )
    }
}

/// Attaches the failing pool operation to SQLite errors
pub trait StorageContext<T> {
    /// Wrap a SQLite error as [`MosaicError::Storage`]
    ///
    /// # Errors
    ///
    /// Propagates the original error tagged with the operation name
    fn during(self, operation: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, rusqlite::Error> {
    fn during(self, operation: &'static str) -> Result<T> {
        self.map_err(|source| MosaicError::Storage { operation, source })
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
