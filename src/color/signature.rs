//! Abundance-ranked salient color extraction
//!
//! An image is shrunk to a small thumbnail, its pixels are clustered, and the
//! cluster centroids are returned ordered by how many pixels they absorbed.
//! The resulting list is the image's color signature.

use crate::color::clustering::{Clusterer, KMeans, assign_to_nearest};
use crate::color::lab::{Lab, Rgb, rgb_to_lab};
use crate::io::configuration::{DEFAULT_CLUSTERS, DEFAULT_THUMBNAIL_MAX};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use image::{DynamicImage, RgbImage, imageops};
use ndarray::Array2;
use num_traits::ToPrimitive;
use std::cmp::Reverse;

/// One entry of a color signature
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SalientColor {
    /// 1-based abundance rank, 1 being the most common color
    pub rank: u32,
    /// Centroid rounded to device RGB
    pub rgb: Rgb,
    /// Lab conversion of `rgb`
    pub lab: Lab,
    /// Number of thumbnail pixels assigned to this centroid
    pub population: usize,
}

/// Reduces images to their `k` most abundant representative colors
pub struct SignatureExtractor {
    clusters: usize,
    thumbnail_max: u32,
    clusterer: Box<dyn Clusterer>,
}

impl Default for SignatureExtractor {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            thumbnail_max: DEFAULT_THUMBNAIL_MAX,
            clusterer: Box::new(KMeans::default()),
        }
    }
}

impl std::fmt::Debug for SignatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureExtractor")
            .field("clusters", &self.clusters)
            .field("thumbnail_max", &self.thumbnail_max)
            .finish_non_exhaustive()
    }
}

impl SignatureExtractor {
    /// Create an extractor producing `clusters` colors from thumbnails no
    /// larger than `thumbnail_max` on their longer side
    ///
    /// # Errors
    ///
    /// Returns an error if either parameter is zero
    pub fn new(clusters: usize, thumbnail_max: u32) -> Result<Self> {
        if clusters == 0 {
            return Err(invalid_parameter(
                "clusters",
                &clusters,
                &"at least one color is required",
            ));
        }
        if thumbnail_max == 0 {
            return Err(invalid_parameter(
                "thumbnail_max",
                &thumbnail_max,
                &"thumbnail must be at least one pixel",
            ));
        }
        Ok(Self {
            clusters,
            thumbnail_max,
            ..Self::default()
        })
    }

    /// Replace the clustering algorithm
    #[must_use]
    pub fn with_clusterer(mut self, clusterer: impl Clusterer + 'static) -> Self {
        self.clusterer = Box::new(clusterer);
        self
    }

    /// Number of colors requested per image
    pub const fn clusters(&self) -> usize {
        self.clusters
    }

    /// Longest thumbnail side used for clustering
    pub const fn thumbnail_max(&self) -> u32 {
        self.thumbnail_max
    }

    /// Extract the signature of a decoded image
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::UnsupportedFormat`] unless the image has exactly
    /// three color channels and no alpha
    pub fn extract(&self, image: &DynamicImage) -> Result<Vec<SalientColor>> {
        let color = image.color();
        if color.channel_count() != 3 || color.has_alpha() {
            return Err(MosaicError::UnsupportedFormat {
                path: None,
                color_type: format!("{color:?}"),
            });
        }
        let rgb = image.to_rgb8();
        Ok(self.extract_rgb(&rgb))
    }

    /// Extract the signature of an RGB buffer
    ///
    /// Returns at most `clusters` colors, fewer when the image has fewer
    /// distinct colors, and none for an empty buffer.
    pub fn extract_rgb(&self, image: &RgbImage) -> Vec<SalientColor> {
        let thumbnail = match thumbnail_dimensions(image.width(), image.height(), self.thumbnail_max)
        {
            Some((width, height)) => imageops::thumbnail(image, width, height),
            None => image.clone(),
        };

        let points = pixel_matrix(&thumbnail);
        let clustering = self.clusterer.cluster(&points, self.clusters);

        // Substituted clusterers may skip the final assignment pass
        let assignments = if clustering.assignments.len() == points.nrows() {
            clustering.assignments.clone()
        } else {
            assign_to_nearest(&points, &clustering.centroids)
        };

        let mut populations = vec![0usize; clustering.len()];
        for &cluster in &assignments {
            if let Some(count) = populations.get_mut(cluster) {
                *count += 1;
            }
        }

        let mut order: Vec<usize> = (0..clustering.len()).collect();
        order.sort_by_key(|&cluster| Reverse(populations.get(cluster).copied().unwrap_or(0)));

        order
            .into_iter()
            .filter_map(|cluster| {
                let population = populations.get(cluster).copied().unwrap_or(0);
                if population == 0 {
                    return None;
                }
                let centroid = clustering.centroids.row(cluster);
                let channels = [
                    centroid.get(0).copied().unwrap_or(0.0),
                    centroid.get(1).copied().unwrap_or(0.0),
                    centroid.get(2).copied().unwrap_or(0.0),
                ];
                let rgb = Rgb::from_centroid(channels);
                Some((rgb, population))
            })
            .zip(1u32..)
            .map(|((rgb, population), rank)| SalientColor {
                rank,
                rgb,
                lab: rgb_to_lab(rgb),
                population,
            })
            .collect()
    }

    /// Lab value of the single most abundant color, if the image has pixels
    pub fn dominant_lab(&self, image: &RgbImage) -> Option<Lab> {
        self.extract_rgb(image).first().map(|color| color.lab)
    }
}

/// Target size of an aspect-preserving downscale so the longer side is at
/// most `max_side`, or `None` if the image already fits
pub fn thumbnail_dimensions(width: u32, height: u32, max_side: u32) -> Option<(u32, u32)> {
    if width <= max_side && height <= max_side {
        return None;
    }
    let scale = f64::from(max_side) / f64::from(width.max(height));
    let scaled = |side: u32| {
        (f64::from(side) * scale)
            .round()
            .to_u32()
            .unwrap_or(1)
            .clamp(1, max_side)
    };
    Some((scaled(width), scaled(height)))
}

/// Flatten an RGB buffer into an `(n_pixels, 3)` matrix of channel values
pub fn pixel_matrix(image: &RgbImage) -> Array2<f64> {
    let data: Vec<f64> = image.as_raw().iter().map(|&c| f64::from(c)).collect();
    let rows = data.len() / 3;
    Array2::from_shape_vec((rows, 3), data).unwrap_or_else(|_| Array2::zeros((0, 3)))
}
