//! End-to-end tests for the transform engine.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lumen_core::{
    Config, ErrorKind, ImageInput, ImageProcessingEngine, ProcessingOptions, SharedCache,
};

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn photo(width: u32, height: u32, tint: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([tint, (x * 3 % 256) as u8, (y * 5 % 256) as u8])
    }))
}

fn engine_with(max_workers: usize, single_flight: bool) -> ImageProcessingEngine {
    let mut config = Config::default();
    config.engine.max_workers = max_workers;
    config.engine.single_flight = single_flight;
    ImageProcessingEngine::new(&config)
}

#[tokio::test]
async fn identical_requests_hit_the_cache() {
    let engine = engine_with(2, false);
    let bytes = encode(&photo(64, 48, 10), ImageFormat::Png);
    let options = ProcessingOptions::default().with_quality(70);

    let first = engine.process(ImageInput::new(bytes.clone()), &options).await;
    let second = engine.process(ImageInput::new(bytes), &options).await;

    assert!(first.success && second.success);
    assert!(!first.cache_hit());
    assert!(second.cache_hit());
    assert_eq!(first.output_size, second.output_size);
    assert_eq!(first.compression_rate, second.compression_rate);
    assert_eq!(first.output, second.output);
}

#[tokio::test]
async fn width_bound_scales_height() {
    let engine = engine_with(2, false);
    let bytes = encode(&photo(100, 50, 20), ImageFormat::Png);

    let result = engine
        .process(
            ImageInput::new(bytes).with_name("wide.png"),
            &ProcessingOptions::default().with_max_width(50),
        )
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.metadata_str("original_dimensions"), Some("100x50"));
    assert_eq!(result.metadata_str("processed_dimensions"), Some("50x25"));

    let output = result.output.unwrap();
    let decoded = image::load_from_memory(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (50, 25));
}

#[tokio::test]
async fn jpeg_input_round_trips() {
    let engine = engine_with(2, false);
    let bytes = encode(&photo(80, 60, 30), ImageFormat::Jpeg);
    let result = engine
        .process(
            ImageInput::new(bytes).with_name("shot.jpg"),
            &ProcessingOptions::default().with_max_height(30),
        )
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.metadata_str("format"), Some("jpeg"));
    assert_eq!(result.metadata_str("processed_dimensions"), Some("40x30"));
}

#[tokio::test]
async fn compression_rate_matches_formula() {
    let engine = engine_with(2, false);
    let bytes = encode(&photo(120, 90, 40), ImageFormat::Png);
    let input_size = bytes.len() as f64;

    let result = engine
        .process(ImageInput::new(bytes), &ProcessingOptions::default())
        .await;
    let expected = (input_size - result.output_size as f64) / input_size * 100.0;
    assert_eq!(result.input_size as f64, input_size);
    assert!((result.compression_rate - expected).abs() < 1e-9);
}

#[tokio::test]
async fn unsupported_and_corrupt_inputs_fail_cleanly() {
    let engine = engine_with(2, false);
    let options = ProcessingOptions::default();

    let gif = engine
        .process(ImageInput::new(b"GIF89a....".to_vec()).with_name("anim.gif"), &options)
        .await;
    assert!(!gif.success);
    assert_eq!(gif.error_kind, Some(ErrorKind::UnsupportedFormat));

    let mut truncated = encode(&photo(32, 32, 50), ImageFormat::Png);
    truncated.truncate(40);
    let corrupt = engine.process(ImageInput::new(truncated), &options).await;
    assert!(!corrupt.success);
    assert_eq!(corrupt.error_kind, Some(ErrorKind::Decode));
    assert!(corrupt.error.is_some());

    let bad_options = engine
        .process(
            ImageInput::new(encode(&photo(8, 8, 60), ImageFormat::Png)),
            &ProcessingOptions::default().with_max_width(0),
        )
        .await;
    assert_eq!(bad_options.error_kind, Some(ErrorKind::InvalidOptions));

    assert!(engine.cache().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_bounds_concurrent_work() {
    let engine = Arc::new(engine_with(2, false));

    let handles: Vec<_> = (0..16u8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let bytes = encode(&photo(256, 256, i * 10), ImageFormat::Png);
            tokio::spawn(async move {
                engine
                    .process(ImageInput::new(bytes), &ProcessingOptions::default())
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().success);
    }

    let stats = engine.stats();
    assert_eq!(stats.total_requests, 16);
    assert_eq!(stats.successful_ops, 16);
    assert!(stats.peak_active_workers >= 1);
    assert!(stats.peak_active_workers <= 2);
    assert_eq!(stats.active_workers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_gauge_never_exceeds_pool() {
    let engine = Arc::new(engine_with(1, false));

    for round in 0..10u32 {
        let handles: Vec<_> = (0..50u32)
            .map(|i| {
                let engine = Arc::clone(&engine);
                let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
                    2,
                    2,
                    Rgb([round as u8, (i % 256) as u8, (i / 256) as u8]),
                ));
                let bytes = encode(&img, ImageFormat::Png);
                tokio::spawn(async move {
                    engine
                        .process(ImageInput::new(bytes), &ProcessingOptions::default())
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().success);
        }
    }

    let stats = engine.stats();
    assert_eq!(stats.cache_hits, 0);
    assert_eq!(stats.peak_active_workers, 1);
    assert_eq!(stats.active_workers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_flight_computes_once() {
    let engine = Arc::new(engine_with(8, true));
    let bytes = encode(&photo(200, 200, 70), ImageFormat::Png);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let bytes = bytes.clone();
            tokio::spawn(async move {
                engine
                    .process(ImageInput::new(bytes), &ProcessingOptions::default())
                    .await
            })
        })
        .collect();

    let mut misses = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.success);
        if !result.cache_hit() {
            misses += 1;
        }
    }
    assert_eq!(misses, 1);
    assert_eq!(engine.stats().cache_hits, 7);
}

#[tokio::test]
async fn shared_cache_across_engines() {
    let config = Config::default();
    let cache = Arc::new(SharedCache::new(&config.cache));
    let a = ImageProcessingEngine::with_cache(&config, Arc::clone(&cache));
    let b = ImageProcessingEngine::with_cache(&config, Arc::clone(&cache));
    let bytes = encode(&photo(40, 40, 80), ImageFormat::Png);

    let first = a
        .process(ImageInput::new(bytes.clone()), &ProcessingOptions::default())
        .await;
    let second = b
        .process(ImageInput::new(bytes), &ProcessingOptions::default())
        .await;
    assert!(!first.cache_hit());
    assert!(second.cache_hit());
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn process_file_reads_and_checks_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.png");
    std::fs::write(&path, encode(&photo(30, 20, 90), ImageFormat::Png)).unwrap();

    let engine = engine_with(2, false);
    let result = engine
        .process_file(&path, &ProcessingOptions::default())
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.metadata_str("original_dimensions"), Some("30x20"));

    let missing = engine
        .process_file(&dir.path().join("missing.png"), &ProcessingOptions::default())
        .await;
    assert_eq!(missing.error_kind, Some(ErrorKind::Io));

    let mut config = Config::default();
    config.limits.max_image_dimension = 16;
    let strict = ImageProcessingEngine::new(&config);
    let too_big = strict
        .process_file(&path, &ProcessingOptions::default())
        .await;
    assert_eq!(too_big.error_kind, Some(ErrorKind::LimitExceeded));

    assert_eq!(engine.stats().failed_ops, 1);
}
