//! Tests for tile partitioning and crop-to-fit

#[cfg(test)]
mod tests {
    use image::RgbImage;
    use photomosaic::mosaic::tiles::{TileSize, crop_to_fit, crop_window, partition};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    // Tests zero-sized tiles are rejected
    // Verified by accepting any size
    #[test]
    fn test_tile_size_rejects_zero() {
        assert!(TileSize::new(0, 10).is_err());
        assert!(TileSize::new(10, 0).is_err());
        let tile = TileSize::new(30, 20).unwrap();
        assert!((tile.aspect() - 1.5).abs() < 1e-12);
    }

    // Tests the grid drops partial tiles on the right and bottom
    // Verified by rounding the grid up
    #[test]
    fn test_grid_dimensions_floor() {
        let tile = TileSize::new(100, 100).unwrap();

        assert_eq!(tile.grid_dimensions(310, 200), (2, 3));
        assert_eq!(tile.grid_dimensions(99, 500), (5, 0));
    }

    // Tests each grid cell holds the matching block of target pixels
    // Verified by swapping row and column offsets
    #[test]
    fn test_partition_pixel_correspondence() {
        let target = gradient(310, 200);
        let tile = TileSize::new(100, 100).unwrap();

        let tiles = partition(&target, tile);

        assert_eq!(tiles.dim(), (2, 3));
        for ((row, col), cell) in tiles.indexed_iter() {
            assert_eq!(cell.dimensions(), (100, 100));
            let x0 = col as u32 * 100;
            let y0 = row as u32 * 100;
            assert_eq!(cell.get_pixel(0, 0), target.get_pixel(x0, y0));
            assert_eq!(cell.get_pixel(99, 42), target.get_pixel(x0 + 99, y0 + 42));
        }
    }

    // Tests a target smaller than one tile yields an empty grid
    // Verified by emitting a clipped tile
    #[test]
    fn test_partition_small_target() {
        let target = gradient(40, 40);
        let tiles = partition(&target, TileSize::new(50, 50).unwrap());
        assert_eq!(tiles.len(), 0);
    }

    // Tests crop windows are centered and trim only the excess axis
    // Verified by anchoring crops at the origin
    #[test]
    fn test_crop_window() {
        let square = TileSize::new(100, 100).unwrap();
        assert_eq!(crop_window(400, 100, square), (150, 0, 100, 100));
        assert_eq!(crop_window(100, 300, square), (0, 100, 100, 100));
        assert_eq!(crop_window(100, 100, square), (0, 0, 100, 100));

        let wide = TileSize::new(150, 100).unwrap();
        assert_eq!(crop_window(160, 100, wide), (5, 0, 150, 100));
        assert_eq!(crop_window(150, 200, wide), (0, 50, 150, 100));
    }

    // Tests crop-to-fit always produces exactly the tile size
    // Verified by skipping the resize step
    #[test]
    fn test_crop_to_fit_exact_size() {
        let tile = TileSize::new(30, 20).unwrap();
        for (width, height) in [(300, 50), (17, 90), (30, 20), (1, 1), (64, 64)] {
            let fitted = crop_to_fit(&gradient(width, height), tile);
            assert_eq!(fitted.dimensions(), (30, 20));
        }
    }

    // Tests crop-to-fit keeps the center of an over-wide image
    // Verified by cropping from the left edge
    #[test]
    fn test_crop_to_fit_keeps_center() {
        let source = RgbImage::from_fn(300, 100, |x, _| {
            if (100..200).contains(&x) {
                image::Rgb([250, 10, 10])
            } else {
                image::Rgb([10, 10, 250])
            }
        });

        let fitted = crop_to_fit(&source, TileSize::new(50, 50).unwrap());

        for pixel in fitted.pixels() {
            assert!(pixel.0[0] > 240, "expected red, got {:?}", pixel.0);
            assert!(pixel.0[2] < 20, "expected red, got {:?}", pixel.0);
        }
    }

    // Tests an image already at tile size passes through untouched
    // Verified by always resampling
    #[test]
    fn test_crop_to_fit_identity() {
        let source = gradient(40, 25);
        let fitted = crop_to_fit(&source, TileSize::new(40, 25).unwrap());
        assert_eq!(fitted, source);
    }
}
