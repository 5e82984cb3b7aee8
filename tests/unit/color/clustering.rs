//! Tests for k-means clustering and nearest-centroid assignment

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};
    use photomosaic::color::clustering::{
        Clusterer, Clustering, KMeans, assign_to_nearest, squared_distance,
    };

    fn repeated(rows: &[([f64; 3], usize)]) -> Array2<f64> {
        let data: Vec<f64> = rows
            .iter()
            .flat_map(|(point, count)| std::iter::repeat_n(*point, *count))
            .flatten()
            .collect();
        let n = data.len() / 3;
        Array2::from_shape_vec((n, 3), data).unwrap()
    }

    // Tests two well separated groups converge to their exact means
    // Verified by returning the seeded centroids without refinement
    #[test]
    fn test_separated_groups_recover_means() {
        let points = repeated(&[
            ([0.0, 0.0, 0.0], 6),
            ([2.0, 2.0, 2.0], 4),
            ([250.0, 250.0, 250.0], 5),
        ]);

        let clustering = KMeans::new(7).cluster(&points, 2);

        assert_eq!(clustering.len(), 2);
        let mut populations = clustering.populations();
        populations.sort_unstable();
        assert_eq!(populations, vec![5, 10]);

        let dark = clustering.assignments[0];
        let light = clustering.assignments[14];
        assert_ne!(dark, light);
        assert!((clustering.centroids[(dark, 0)] - 0.8).abs() < 1e-3);
        assert!((clustering.centroids[(light, 0)] - 250.0).abs() < 1e-3);
    }

    // Tests k is capped by the number of distinct points
    // Verified by removing the distinct-point cap
    #[test]
    fn test_fewer_distinct_points_than_k() {
        let points = repeated(&[
            ([10.0, 0.0, 0.0], 3),
            ([0.0, 10.0, 0.0], 3),
            ([0.0, 0.0, 10.0], 3),
        ]);

        let clustering = KMeans::default().cluster(&points, 5);

        assert_eq!(clustering.len(), 3);
        assert!(clustering.populations().iter().all(|&count| count == 3));
    }

    // Tests a single distinct color yields a single centroid
    // Verified by seeding k centroids unconditionally
    #[test]
    fn test_single_color() {
        let points = repeated(&[([40.0, 80.0, 120.0], 25)]);

        let clustering = KMeans::default().cluster(&points, 4);

        assert_eq!(clustering.len(), 1);
        for (actual, expected) in clustering.centroids.row(0).iter().zip([40.0, 80.0, 120.0]) {
            assert!((actual - expected).abs() < 1e-3);
        }
        assert_eq!(clustering.populations(), vec![25]);
    }

    // Tests empty input and k = 0 both produce an empty clustering
    // Verified by removing the early return
    #[test]
    fn test_degenerate_inputs() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(KMeans::default().cluster(&empty, 4).is_empty());

        let points = repeated(&[([1.0, 2.0, 3.0], 2)]);
        let clustering = KMeans::default().cluster(&points, 0);
        assert!(clustering.is_empty());
        assert!(clustering.assignments.is_empty());
    }

    // Tests the same seed reproduces the same centroids
    // Verified by deriving the seed from the system clock
    #[test]
    fn test_seeded_runs_are_deterministic() {
        let points: Array2<f64> = Array2::from_shape_fn((300, 3), |(i, c)| {
            ((i * 37 + c * 101) % 256) as f64
        });

        let first = KMeans::new(99).cluster(&points, 4);
        let second = KMeans::new(99).cluster(&points, 4);

        assert_eq!(first.centroids, second.centroids);
        assert_eq!(first.assignments, second.assignments);
    }

    // Tests every point is assigned to a centroid that is at least as near as any other
    // Verified by returning the farthest centroid
    #[test]
    fn test_assignments_are_nearest() {
        let points: Array2<f64> = Array2::from_shape_fn((120, 3), |(i, c)| {
            ((i * 53 + c * 17) % 256) as f64
        });

        let clustering = KMeans::new(3).cluster(&points, 4);

        for (point, &assigned) in points.outer_iter().zip(clustering.assignments.iter()) {
            let own = squared_distance(point, clustering.centroids.row(assigned));
            for centroid in clustering.centroids.outer_iter() {
                assert!(own <= squared_distance(point, centroid) + 1e-9);
            }
        }
    }

    // Tests equidistant points go to the lowest centroid index
    // Verified by using <= in the nearest comparison
    #[test]
    fn test_assign_to_nearest_breaks_ties_low() {
        let centroids = array![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]];
        let points = array![[5.0, 0.0, 0.0], [9.0, 0.0, 0.0], [1.0, 0.0, 0.0]];

        assert_eq!(assign_to_nearest(&points, &centroids), vec![0, 1, 0]);
    }

    // Tests population counting over assignments
    // Verified by counting centroids instead of points
    #[test]
    fn test_populations() {
        let clustering = Clustering {
            centroids: Array2::zeros((3, 3)),
            assignments: vec![2, 0, 2, 2, 0],
        };

        assert_eq!(clustering.populations(), vec![2, 0, 3]);
    }

    // Tests centroids come back on the 0..=255 input scale
    // Verified by dropping the rescale after clustering
    #[test]
    fn test_centroids_keep_input_scale() {
        let points = repeated(&[([255.0, 0.0, 0.0], 8), ([0.0, 0.0, 255.0], 8)]);

        let clustering = KMeans::default().cluster(&points, 2);

        assert_eq!(clustering.len(), 2);
        let red = clustering.assignments[0];
        let blue = clustering.assignments[15];
        assert!((clustering.centroids[(red, 0)] - 255.0).abs() < 1e-3);
        assert!((clustering.centroids[(blue, 2)] - 255.0).abs() < 1e-3);
        assert!(clustering.centroids[(red, 2)].abs() < 1e-3);
    }

    // Tests a single-pass, loose-tolerance configuration still assigns every point
    // Verified by returning the library's stale indices instead of reassigning
    #[test]
    fn test_custom_limits() {
        let points: Array2<f64> = Array2::from_shape_fn((200, 3), |(i, c)| {
            ((i * 29 + c * 61) % 256) as f64
        });
        let kmeans = KMeans {
            max_iterations: 1,
            tolerance: 0.5,
            seed: 11,
        };

        let clustering = kmeans.cluster(&points, 4);

        assert_eq!(clustering.len(), 4);
        assert_eq!(clustering.assignments.len(), 200);
        for (point, &assigned) in points.outer_iter().zip(clustering.assignments.iter()) {
            let own = squared_distance(point, clustering.centroids.row(assigned));
            for centroid in clustering.centroids.outer_iter() {
                assert!(own <= squared_distance(point, centroid) + 1e-9);
            }
        }
    }
}
