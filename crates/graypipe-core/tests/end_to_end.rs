//! End-to-end runs of the pipeline against images on disk.
//!
//! These tests verify:
//! - Four valid images produce four `true` signals and a parseable report
//! - Output images are 500x500 and achromatic
//! - A missing source aborts the run without writing its output

use graypipe_core::report::{parse_report, ReportWriter};
use graypipe_core::{Config, FailurePolicy, GraypipeError, MeasureWindow, Pipeline};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use std::path::Path;
use tempfile::TempDir;

fn create_source(root: &Path, name: &str, width: u32, height: u32, color: [u8; 3]) -> String {
    let dir = root.join("images");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
        .save(&path)
        .unwrap();
    path.to_string_lossy().into_owned()
}

fn config_for(sources: Vec<String>, policy: FailurePolicy) -> Config {
    let mut config = Config::default();
    config.paths.sources = sources;
    config.pipeline.failure_policy = policy;
    config
}

#[tokio::test]
async fn four_images_produce_four_successes_and_a_report() {
    let temp_dir = TempDir::new().unwrap();
    let sources = vec![
        create_source(temp_dir.path(), "image1.jpeg", 640, 480, [255, 0, 0]),
        create_source(temp_dir.path(), "image2.jpeg", 300, 900, [0, 255, 0]),
        create_source(temp_dir.path(), "image3.jpeg", 500, 500, [0, 0, 255]),
        create_source(temp_dir.path(), "image4.jpeg", 50, 20, [200, 180, 20]),
    ];

    let pipeline = Pipeline::with_tracing(config_for(sources.clone(), FailurePolicy::Abort));
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.outcomes.len(), 4);
    assert!(summary.outcomes.iter().all(|o| o.success));

    for outcome in &summary.outcomes {
        let destination = outcome.destination_path.as_ref().unwrap();
        let output = image::open(destination).unwrap();
        assert_eq!(output.dimensions(), (500, 500));
        assert!(output
            .to_rgb8()
            .pixels()
            .step_by(997)
            .all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    let report_path = temp_dir.path().join("report.txt");
    let mut writer = ReportWriter::create(&report_path, MeasureWindow::Wiring).unwrap();
    writer.write_metrics(&summary.metrics).unwrap();
    drop(writer);

    let text = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(text.lines().count(), 2);
    let values = parse_report(&text).unwrap();
    assert_eq!(
        values.time_us,
        summary.metrics.wiring_time.as_micros()
    );
}

#[tokio::test]
async fn single_red_image_becomes_gray_square() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_source(temp_dir.path(), "a.jpeg", 200, 300, [255, 0, 0]);

    let pipeline = Pipeline::with_tracing(config_for(vec![source], FailurePolicy::Abort));
    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.metrics.succeeded, 1);

    let expected = temp_dir.path().join("images").join("output").join("a.jpeg");
    assert!(expected.exists());

    let output = image::open(&expected).unwrap();
    assert_eq!(output.width(), 500);
    assert_eq!(output.height(), 500);
    let rgb = output.to_rgb8();
    for y in (0..500).step_by(50) {
        for x in (0..500).step_by(50) {
            let p = rgb.get_pixel(x, y);
            assert_eq!(p[0], p[1]);
            assert_eq!(p[1], p[2]);
        }
    }
}

#[tokio::test]
async fn missing_source_aborts_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir
        .path()
        .join("images")
        .join("nope.jpeg")
        .to_string_lossy()
        .into_owned();

    let pipeline = Pipeline::with_tracing(config_for(vec![missing], FailurePolicy::Abort));
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, GraypipeError::Job(_)));
    assert!(!temp_dir
        .path()
        .join("images")
        .join("output")
        .join("nope.jpeg")
        .exists());
}

#[tokio::test]
async fn corrupt_source_is_skipped_when_configured() {
    let temp_dir = TempDir::new().unwrap();
    let good = create_source(temp_dir.path(), "good.jpeg", 40, 40, [10, 20, 30]);
    let corrupt_path = temp_dir.path().join("images").join("corrupt.jpeg");
    std::fs::write(&corrupt_path, b"this is not a valid image file").unwrap();
    let corrupt = corrupt_path.to_string_lossy().into_owned();

    let pipeline = Pipeline::with_tracing(config_for(
        vec![corrupt.clone(), good.clone()],
        FailurePolicy::Skip,
    ));
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.outcomes[0].source_path, corrupt);
    assert!(!summary.outcomes[0].success);
    assert_eq!(summary.outcomes[1].source_path, good);
    assert!(summary.outcomes[1].success);
}
