//! Tests for canvas assembly and the mosaic pipeline

#[cfg(test)]
mod tests {
    use image::RgbImage;
    use ndarray::Array2;
    use photomosaic::MosaicError;
    use photomosaic::color::signature::SignatureExtractor;
    use photomosaic::mosaic::assembler::{MosaicBuilder, assemble, photomosaic};
    use photomosaic::mosaic::matcher::MatchConfig;
    use photomosaic::mosaic::tiles::TileSize;
    use photomosaic::pool::build::PoolBuilder;
    use photomosaic::pool::store::ImagePool;
    use std::path::Path;
    use std::time::Duration;

    const PALETTE: [[u8; 3]; 6] = [
        [255, 0, 0],
        [0, 255, 0],
        [0, 0, 255],
        [255, 255, 0],
        [0, 255, 255],
        [255, 0, 255],
    ];

    fn pool_of(dir: &Path, colors: &[[u8; 3]]) -> ImagePool {
        let paths: Vec<_> = colors
            .iter()
            .enumerate()
            .map(|(index, &color)| {
                let path = dir.join(format!("{index}.png"));
                RgbImage::from_pixel(36, 24, image::Rgb(color))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect();
        let pool = ImagePool::open_in_memory().unwrap();
        PoolBuilder::new(&pool, &SignatureExtractor::default())
            .build(&paths)
            .unwrap();
        pool
    }

    // 3 columns by 2 rows of 100px blocks, one palette color each
    fn palette_target() -> RgbImage {
        RgbImage::from_fn(300, 200, |x, y| {
            let index = (y / 100 * 3 + x / 100) as usize;
            image::Rgb(PALETTE[index])
        })
    }

    fn single_use() -> MatchConfig {
        MatchConfig {
            max_usages: 1,
            candidate_limit: 10,
            timeout: Duration::from_secs(30),
        }
    }

    fn assert_near(actual: [u8; 3], expected: [u8; 3]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!(a.abs_diff(*e) <= 2, "expected {expected:?}, got {actual:?}");
        }
    }

    // Tests tiles land at (col * width, row * height) on a canvas sized to the grid
    // Verified by swapping x and y offsets
    #[test]
    fn test_assemble_offsets() {
        let tile = TileSize::new(100, 100).unwrap();
        let tiles = Array2::from_shape_fn((2, 3), |(row, col)| {
            RgbImage::from_pixel(100, 100, image::Rgb(PALETTE[row * 3 + col]))
        });

        let canvas = assemble(&tiles, tile);

        assert_eq!(canvas.dimensions(), (300, 200));
        for row in 0..2u32 {
            for col in 0..3u32 {
                let expected = PALETTE[(row * 3 + col) as usize];
                assert_eq!(canvas.get_pixel(col * 100, row * 100).0, expected);
                assert_eq!(canvas.get_pixel(col * 100 + 99, row * 100 + 99).0, expected);
            }
        }
    }

    // Tests each region of the target is replaced by the pool image of the same color
    // Verified by assigning pool images in registration order
    #[test]
    fn test_mosaic_reproduces_solid_regions() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_of(dir.path(), &PALETTE);
        let extractor = SignatureExtractor::default();
        let tile = TileSize::new(100, 100).unwrap();

        let canvas = MosaicBuilder::new(&pool, &extractor, tile)
            .with_config(single_use())
            .photomosaic(&palette_target())
            .unwrap();

        assert_eq!(canvas.dimensions(), (300, 200));
        for (index, &color) in PALETTE.iter().enumerate() {
            let x = (index as u32 % 3) * 100 + 50;
            let y = (index as u32 / 3) * 100 + 50;
            assert_near(canvas.get_pixel(x, y).0, color);
        }
        assert!(pool.images().unwrap().iter().all(|image| image.usage_count == 1));
    }

    // Tests usage counts are reset at the start of every run
    // Verified by removing the reset
    #[test]
    fn test_runs_start_from_zero_usage() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_of(dir.path(), &PALETTE);
        let extractor = SignatureExtractor::default();
        let builder = MosaicBuilder::new(&pool, &extractor, TileSize::new(100, 100).unwrap())
            .with_config(single_use());

        builder.photomosaic(&palette_target()).unwrap();
        let second = builder.photomosaic(&palette_target());

        assert!(second.is_ok());
    }

    // Tests a pool too small for the grid under the cap aborts the run
    // Verified by reusing capped images
    #[test]
    fn test_exhausted_pool_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_of(dir.path(), &PALETTE[..4]);
        let extractor = SignatureExtractor::default();

        let result = MosaicBuilder::new(&pool, &extractor, TileSize::new(100, 100).unwrap())
            .with_config(single_use())
            .photomosaic(&palette_target());

        assert!(matches!(
            result,
            Err(MosaicError::PoolExhausted { max_usages: 1 })
        ));
    }

    // Tests a target smaller than one tile is rejected
    // Verified by returning an empty canvas
    #[test]
    fn test_target_smaller_than_tile() {
        let pool = ImagePool::open_in_memory().unwrap();
        let extractor = SignatureExtractor::default();
        let target = RgbImage::new(50, 80);

        let result = MosaicBuilder::new(&pool, &extractor, TileSize::new(100, 100).unwrap())
            .photomosaic(&target);

        assert!(matches!(
            result,
            Err(MosaicError::InvalidParameter { parameter: "target", .. })
        ));
    }

    // Tests a timeout reports the grid position of the failing tile
    // Verified by dropping the position when mapping the error
    #[test]
    fn test_timeout_reports_tile_position() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_of(dir.path(), &PALETTE);
        let extractor = SignatureExtractor::default();
        let config = MatchConfig {
            timeout: Duration::ZERO,
            ..single_use()
        };

        let result = MosaicBuilder::new(&pool, &extractor, TileSize::new(100, 100).unwrap())
            .with_config(config)
            .photomosaic(&palette_target());

        assert!(matches!(
            result,
            Err(MosaicError::MatchTimeout {
                tile: Some((0, 0)),
                budget_ms: 0
            })
        ));
    }

    // Tests the one-call entry point rejects a pool path with no store behind it
    // Verified by creating an empty store at the given path
    #[test]
    fn test_photomosaic_missing_pool() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.png");
        palette_target().save(&target).unwrap();
        let missing = dir.path().join("imagepol.db");

        let result = photomosaic(&target, TileSize::new(100, 100).unwrap(), &missing);

        assert!(matches!(
            result,
            Err(MosaicError::StorageUnavailable { .. })
        ));
        assert!(!missing.exists());
    }

    // Tests the one-call entry point renders from an existing pool store on disk
    // Verified by opening the store read-only
    #[test]
    fn test_photomosaic_from_stored_pool() {
        let dir = tempfile::tempdir().unwrap();
        let pool_path = dir.path().join("pool.db");
        {
            let pool = ImagePool::open(&pool_path).unwrap();
            let paths: Vec<_> = PALETTE
                .iter()
                .enumerate()
                .map(|(index, &color)| {
                    let path = dir.path().join(format!("{index}.png"));
                    RgbImage::from_pixel(36, 24, image::Rgb(color))
                        .save(&path)
                        .unwrap();
                    path
                })
                .collect();
            PoolBuilder::new(&pool, &SignatureExtractor::default())
                .build(&paths)
                .unwrap();
        }
        let target = dir.path().join("target.png");
        palette_target().save(&target).unwrap();

        let canvas = photomosaic(&target, TileSize::new(100, 100).unwrap(), &pool_path).unwrap();

        assert_eq!(canvas.dimensions(), (300, 200));
        assert_near(canvas.get_pixel(50, 50).0, PALETTE[0]);
    }
}
