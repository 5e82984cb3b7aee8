//! Input/output operations, configuration and error handling

/// Command-line interface and subcommand dispatch
pub mod cli;
/// Default constants for extraction, matching and tiling
pub mod configuration;
/// Diagnostic listing of pool contents
pub mod dump;
/// Error taxonomy and result alias
pub mod error;
/// Image decode and encode boundaries
pub mod image;
/// Terminal progress bars
pub mod progress;
