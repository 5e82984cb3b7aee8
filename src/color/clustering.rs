//! Centroid clustering of color vectors
//!
//! The extractor only depends on [`Clusterer`], so any algorithm that turns a
//! set of points into centroids plus per-point assignments can stand in for
//! the default seeded k-means.

use crate::io::configuration::{DEFAULT_SEED, KMEANS_MAX_ITERATIONS, KMEANS_TOLERANCE};
use kmeans_colors::get_kmeans_hamerly;
use ndarray::{Array2, ArrayView1};
use palette::Srgb;
use std::collections::HashSet;

/// Result of clustering `n` points of dimension `d` into `k` groups
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Centroid coordinates, shape `(k, d)`
    pub centroids: Array2<f64>,
    /// Index of the nearest centroid for each input point
    pub assignments: Vec<usize>,
}

impl Clustering {
    /// Clustering of an empty input
    pub fn empty(dimensions: usize) -> Self {
        Self {
            centroids: Array2::zeros((0, dimensions)),
            assignments: Vec::new(),
        }
    }

    /// Number of centroids produced
    pub fn len(&self) -> usize {
        self.centroids.nrows()
    }

    /// Whether no centroids were produced
    pub fn is_empty(&self) -> bool {
        self.centroids.nrows() == 0
    }

    /// Number of points assigned to each centroid
    pub fn populations(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.len()];
        for &cluster in &self.assignments {
            if let Some(count) = counts.get_mut(cluster) {
                *count += 1;
            }
        }
        counts
    }
}

/// Groups points (one per row) into at most `k` clusters
pub trait Clusterer: Send + Sync {
    /// Cluster `points` into at most `k` centroids
    ///
    /// Implementations return fewer than `k` centroids when the input holds
    /// fewer than `k` distinct points.
    fn cluster(&self, points: &Array2<f64>, k: usize) -> Clustering;
}

/// Hamerly-accelerated k-means over sRGB, seeded for reproducible results
///
/// Points are read as RGB triples in `0..=255` and clustered by
/// `kmeans_colors` in normalised sRGB. Centroids come back on the input scale.
#[derive(Clone, Copy, Debug)]
pub struct KMeans {
    /// Upper bound on refinement passes
    pub max_iterations: usize,
    /// Total centroid movement per pass, in normalised sRGB, that counts as converged
    pub tolerance: f32,
    /// Seed for centroid initialisation
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl KMeans {
    /// Create a k-means clusterer with default iteration limits
    pub const fn new(seed: u64) -> Self {
        Self {
            max_iterations: KMEANS_MAX_ITERATIONS,
            tolerance: KMEANS_TOLERANCE,
            seed,
        }
    }
}

impl Clusterer for KMeans {
    fn cluster(&self, points: &Array2<f64>, k: usize) -> Clustering {
        let dimensions = points.ncols();
        if points.nrows() == 0 || k == 0 || dimensions < 3 {
            return Clustering::empty(dimensions);
        }

        // Cluster indices are stored as u8
        let k = k.min(usize::from(u8::MAX));
        let k = k.min(count_distinct(points, k));

        let buffer: Vec<Srgb<f32>> = points
            .outer_iter()
            .map(|row| {
                let channel = |c: usize| row.get(c).map_or(0.0, |&v| (v / 255.0) as f32);
                Srgb::new(channel(0), channel(1), channel(2))
            })
            .collect();

        let result = get_kmeans_hamerly(
            k,
            self.max_iterations,
            self.tolerance,
            false,
            &buffer,
            self.seed,
        );

        let mut centroids = Array2::<f64>::zeros((result.centroids.len(), dimensions));
        for (mut row, centroid) in centroids.outer_iter_mut().zip(&result.centroids) {
            let channels = [centroid.red, centroid.green, centroid.blue];
            for (slot, value) in row.iter_mut().zip(channels) {
                *slot = f64::from(value) * 255.0;
            }
        }

        // Returned indices predate the final centroid update
        let assignments = assign_to_nearest(points, &centroids);

        Clustering {
            centroids,
            assignments,
        }
    }
}

/// Vector quantization: index of the nearest centroid for every point
///
/// Ties go to the lowest centroid index.
pub fn assign_to_nearest(points: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    points
        .outer_iter()
        .map(|point| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (index, centroid) in centroids.outer_iter().enumerate() {
                let d = squared_distance(point, centroid);
                if d < best_distance {
                    best_distance = d;
                    best = index;
                }
            }
            best
        })
        .collect()
}

/// Squared Euclidean distance between two equally sized vectors
pub fn squared_distance(lhs: ArrayView1<'_, f64>, rhs: ArrayView1<'_, f64>) -> f64 {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(&a, &b)| (a - b) * (a - b))
        .sum()
}

// Counts distinct rows, stopping once `limit` have been seen
fn count_distinct(points: &Array2<f64>, limit: usize) -> usize {
    let mut seen: HashSet<Vec<u64>> = HashSet::new();
    for row in points.outer_iter() {
        seen.insert(row.iter().map(|v| v.to_bits()).collect());
        if seen.len() >= limit {
            break;
        }
    }
    seen.len()
}
