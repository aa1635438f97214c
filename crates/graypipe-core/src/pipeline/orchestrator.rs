//! Pipeline orchestration: wires the four stages, drains terminal signals and
//! computes run metrics. No transform work happens here.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{GraypipeError, JobFailure, PipelineError, Result};
use crate::memory::AllocationSample;
use crate::types::{OutcomeRecord, PipelineMetrics, RunSummary};

use super::channel::StageTask;
use super::stages::{self, StageContext};
use super::telemetry::{Telemetry, TracingTelemetry};

/// Runs the fixed load → resize → grayscale → save chain.
pub struct Pipeline {
    config: Arc<Config>,
    telemetry: Arc<dyn Telemetry>,
}

impl Pipeline {
    /// Create a pipeline reporting to the given telemetry sink.
    pub fn new(config: Config, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            config: Arc::new(config),
            telemetry,
        }
    }

    /// Create a pipeline that reports through `tracing`.
    pub fn with_tracing(config: Config) -> Self {
        Self::new(config, Arc::new(TracingTelemetry))
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process the configured source list.
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_sources(self.config.paths.sources.clone()).await
    }

    /// Process `sources` in order.
    ///
    /// Returns the summary once the terminal channel is closed and every
    /// stage worker has exited. Under the abort policy the first job failure
    /// is returned as an error; signals drained before it are discarded with
    /// the summary.
    pub async fn run_sources(&self, sources: Vec<String>) -> Result<RunSummary> {
        let memory = AllocationSample::now();
        let ctx = StageContext::new(Arc::clone(&self.config), Arc::clone(&self.telemetry));
        self.telemetry.run_started(sources.len());

        let start = Instant::now();
        let (loaded, load_task) = stages::load(sources, &ctx).into_parts();
        let (resized, resize_task) = stages::resize(loaded, &ctx).into_parts();
        let (grayed, grayscale_task) = stages::convert_to_grayscale(resized, &ctx).into_parts();
        let (mut signals, save_task) = stages::save(grayed, &ctx).into_parts();
        let wiring_time = start.elapsed();

        let mut outcomes = Vec::new();
        let mut succeeded = 0;
        let mut failed = 0;
        while let Some(outcome) = signals.recv().await {
            self.telemetry.job_finished(&outcome);
            if outcome.is_ok() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            outcomes.push(OutcomeRecord::from(&outcome));
        }
        let total_time = start.elapsed();

        if let Some(failure) =
            join_stages([load_task, resize_task, grayscale_task, save_task]).await?
        {
            return Err(GraypipeError::Job(failure));
        }

        let metrics = PipelineMetrics {
            wiring_time,
            total_time,
            memory_allocated: memory.delta(),
            succeeded,
            failed,
        };
        tracing::debug!(
            "Pipeline finished: {} ok, {} failed, wiring {:?}, total {:?}",
            succeeded,
            failed,
            wiring_time,
            total_time
        );

        Ok(RunSummary { metrics, outcomes })
    }
}

/// Wait for every stage worker and return the earliest (in chain order) job
/// failure that stopped one of them.
async fn join_stages(
    tasks: [StageTask; 4],
) -> std::result::Result<Option<JobFailure>, PipelineError> {
    let mut first_failure = None;
    for StageTask { stage, task } in tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => {
                if first_failure.is_none() {
                    first_failure = Some(failure);
                }
            }
            Err(e) => {
                return Err(PipelineError::TaskFailed {
                    stage,
                    message: e.to_string(),
                })
            }
        }
    }
    Ok(first_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::pipeline::telemetry::{RecordingTelemetry, TelemetryEvent};
    use crate::types::StageKind;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
    use std::path::Path;

    /// Write a solid-color JPEG under `<root>/images/<name>` and return its path.
    fn write_source(root: &Path, name: &str, width: u32, height: u32) -> String {
        let dir = root.join("images");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 0, 0])))
            .save(&path)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    fn test_config(policy: FailurePolicy) -> Config {
        let mut config = Config::default();
        config.pipeline.failure_policy = policy;
        config
    }

    #[tokio::test]
    async fn test_one_signal_per_source() {
        let dir = tempfile::tempdir().unwrap();
        let sources: Vec<String> = (0..4)
            .map(|i| write_source(dir.path(), &format!("image{}.jpeg", i), 64, 48))
            .collect();

        let pipeline = Pipeline::new(
            test_config(FailurePolicy::Abort),
            RecordingTelemetry::new(),
        );
        let summary = pipeline.run_sources(sources).await.unwrap();

        assert_eq!(summary.outcomes.len(), 4);
        assert!(summary.all_succeeded());
        assert_eq!(summary.metrics.succeeded, 4);
        assert_eq!(summary.metrics.failed, 0);
        assert!(summary.metrics.total_time >= summary.metrics.wiring_time);
    }

    #[tokio::test]
    async fn test_empty_source_list_closes_cleanly() {
        let pipeline = Pipeline::new(Config::default(), RecordingTelemetry::new());
        let summary = pipeline.run_sources(vec![]).await.unwrap();
        assert!(summary.outcomes.is_empty());
        assert!(summary.all_succeeded());
    }

    #[tokio::test]
    async fn test_stage_order_matches_source_order() {
        let dir = tempfile::tempdir().unwrap();
        // Different sizes give different per-item latencies
        let sources: Vec<String> = [(400, 300), (16, 16), (900, 700), (32, 8), (120, 240)]
            .iter()
            .enumerate()
            .map(|(i, (w, h))| write_source(dir.path(), &format!("img{}.jpeg", i), *w, *h))
            .collect();

        let telemetry = RecordingTelemetry::new();
        let pipeline = Pipeline::new(test_config(FailurePolicy::Abort), telemetry.clone());
        let summary = pipeline.run_sources(sources.clone()).await.unwrap();

        let drained: Vec<String> = summary
            .outcomes
            .iter()
            .map(|o| o.source_path.clone())
            .collect();
        assert_eq!(drained, sources);

        for stage in [
            StageKind::Load,
            StageKind::Resize,
            StageKind::Grayscale,
            StageKind::Save,
        ] {
            assert_eq!(telemetry.stage_sequence(stage), sources, "stage {}", stage);
        }
    }

    #[tokio::test]
    async fn test_output_is_resized_and_gray() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), "a.jpeg", 200, 300);

        let pipeline = Pipeline::new(Config::default(), RecordingTelemetry::new());
        let summary = pipeline.run_sources(vec![source]).await.unwrap();

        let destination = summary.outcomes[0].destination_path.clone().unwrap();
        assert_eq!(destination, dir.path().join("images/output/a.jpeg"));

        let output = image::open(&destination).unwrap();
        assert_eq!(output.dimensions(), (500, 500));
        let rgb = output.to_rgb8();
        for (x, y) in [(0, 0), (250, 250), (499, 499), (10, 400)] {
            let p = rgb.get_pixel(x, y);
            assert!(p[0] == p[1] && p[1] == p[2], "pixel ({}, {}) = {:?}", x, y, p);
        }
    }

    #[tokio::test]
    async fn test_abort_policy_stops_at_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_source(dir.path(), "good.jpeg", 32, 32);
        let missing = dir
            .path()
            .join("images/missing.jpeg")
            .to_string_lossy()
            .into_owned();

        let telemetry = RecordingTelemetry::new();
        let pipeline = Pipeline::new(test_config(FailurePolicy::Abort), telemetry.clone());
        let err = pipeline
            .run_sources(vec![good, missing.clone()])
            .await
            .unwrap_err();

        match err {
            GraypipeError::Job(failure) => {
                assert_eq!(failure.stage, StageKind::Load);
                assert_eq!(failure.source_path, missing);
            }
            other => panic!("unexpected error: {}", other),
        }

        let signalled_missing = telemetry.events().iter().any(|e| {
            matches!(e, TelemetryEvent::JobFinished { source_path, .. } if *source_path == missing)
        });
        assert!(!signalled_missing);
        assert!(!dir.path().join("images/output/missing.jpeg").exists());
    }

    #[tokio::test]
    async fn test_skip_policy_reports_false_signal() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_source(dir.path(), "first.jpeg", 32, 32);
        let missing = dir
            .path()
            .join("images/missing.jpeg")
            .to_string_lossy()
            .into_owned();
        let last = write_source(dir.path(), "last.jpeg", 32, 32);

        let pipeline = Pipeline::new(test_config(FailurePolicy::Skip), RecordingTelemetry::new());
        let summary = pipeline
            .run_sources(vec![first, missing.clone(), last])
            .await
            .unwrap();

        let flags: Vec<bool> = summary.outcomes.iter().map(|o| o.success).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(summary.outcomes[1].source_path, missing);
        assert_eq!(summary.metrics.failed, 1);
        assert!(!summary.all_succeeded());
    }

    #[tokio::test]
    async fn test_failed_load_records_no_stage_timing() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_source(dir.path(), "good.jpeg", 16, 16);
        let missing = dir
            .path()
            .join("images/missing.jpeg")
            .to_string_lossy()
            .into_owned();

        let telemetry = RecordingTelemetry::new();
        let pipeline = Pipeline::new(test_config(FailurePolicy::Skip), telemetry.clone());
        pipeline
            .run_sources(vec![missing.clone(), good.clone()])
            .await
            .unwrap();

        for stage in [
            StageKind::Load,
            StageKind::Resize,
            StageKind::Grayscale,
            StageKind::Save,
        ] {
            assert_eq!(telemetry.stage_sequence(stage), vec![good.clone()], "stage {}", stage);
        }
        assert!(telemetry.events().contains(&TelemetryEvent::JobFinished {
            source_path: missing,
            success: false,
        }));
    }

    #[tokio::test]
    async fn test_skip_policy_reports_underivable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let stray = dir.path().join("stray.jpeg");
        DynamicImage::new_rgb8(8, 8).save(&stray).unwrap();

        let mut config = test_config(FailurePolicy::Skip);
        config.paths.input_segment = "no-such-segment/".to_string();
        let pipeline = Pipeline::new(config, RecordingTelemetry::new());
        let summary = pipeline
            .run_sources(vec![stray.to_string_lossy().into_owned()])
            .await
            .unwrap();

        assert_eq!(summary.outcomes.len(), 1);
        assert!(!summary.outcomes[0].success);
        assert!(summary.outcomes[0]
            .error
            .as_deref()
            .unwrap()
            .contains("Cannot derive destination"));
    }

    #[tokio::test]
    async fn test_telemetry_records_start_and_each_signal() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            write_source(dir.path(), "a.jpeg", 16, 16),
            write_source(dir.path(), "b.jpeg", 16, 16),
        ];

        let telemetry = RecordingTelemetry::new();
        let pipeline = Pipeline::new(Config::default(), telemetry.clone());
        pipeline.run_sources(sources).await.unwrap();

        let events = telemetry.events();
        assert_eq!(events[0], TelemetryEvent::RunStarted { sources: 2 });
        let finished = events
            .iter()
            .filter(|e| matches!(e, TelemetryEvent::JobFinished { success: true, .. }))
            .count();
        assert_eq!(finished, 2);
        let stage_records = events
            .iter()
            .filter(|e| matches!(e, TelemetryEvent::StageCompleted { .. }))
            .count();
        assert_eq!(stage_records, 8);
    }
}
