//! Color science: Lab conversion, clustering and salient color signatures

/// Centroid clustering of color vectors behind a substitutable interface
pub mod clustering;
/// Device RGB and CIE Lab values with chroma-plane distances
pub mod lab;
/// Abundance-ranked color signature extraction
pub mod signature;

pub use lab::{Lab, Rgb, rgb_to_lab};
pub use signature::{SalientColor, SignatureExtractor};
