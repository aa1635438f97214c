//! The four pipeline stages.
//!
//! ```text
//! sources ─▶ load ─▶ resize ─▶ grayscale ─▶ save ─▶ terminal signals
//! ```
//!
//! Each stage allocates one output channel and spawns one worker. The worker
//! pulls items in arrival order until its input closes, then returns, which
//! drops its sender and closes the output for the next stage. With one worker
//! per stage the source order is preserved end to end.
//!
//! Transforms run on the blocking pool. The job is moved into the blocking
//! closure and handed back, so no raster is ever shared between tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::GenericImageView;
use tokio::sync::mpsc;

use crate::config::{Config, FailurePolicy};
use crate::error::{JobFailure, PipelineError, PipelineResult};
use crate::types::{Job, SaveOutcome, SavedImage, StageItem, StageKind};

use super::channel::{handoff_channel, StageHandle};
use super::codec::ImageCodec;
use super::telemetry::Telemetry;
use super::transform::{grayscale, Resizer};

/// Shared, read-only context handed to every stage at construction.
#[derive(Clone)]
pub struct StageContext {
    pub config: Arc<Config>,
    pub telemetry: Arc<dyn Telemetry>,
}

impl StageContext {
    pub fn new(config: Arc<Config>, telemetry: Arc<dyn Telemetry>) -> Self {
        Self { config, telemetry }
    }

    fn buffer_size(&self) -> usize {
        self.config.pipeline.buffer_size
    }

    fn policy(&self) -> FailurePolicy {
        self.config.pipeline.failure_policy
    }

    /// Apply the failure policy: `Ok` hands the failure back to be forwarded
    /// downstream, `Err` stops the worker.
    fn on_failure(&self, failure: JobFailure) -> Result<JobFailure, JobFailure> {
        match self.policy() {
            FailurePolicy::Abort => {
                tracing::error!("{}", failure);
                Err(failure)
            }
            FailurePolicy::Skip => {
                tracing::warn!("Skipping: {}", failure);
                Ok(failure)
            }
        }
    }
}

/// Run a blocking closure on the blocking pool, mapping a join failure onto
/// the stage that spawned it.
async fn run_blocking<T, F>(stage: StageKind, f: F) -> PipelineResult<T>
where
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::TaskFailed {
            stage,
            message: e.to_string(),
        })?
}

/// Generic job-to-job stage: apply `transform` to every successful job and
/// pass failures through untouched.
fn spawn_job_stage<F>(
    stage: StageKind,
    mut input: mpsc::Receiver<StageItem>,
    ctx: &StageContext,
    transform: F,
) -> StageHandle<StageItem>
where
    F: Fn(Job) -> PipelineResult<Job> + Send + Sync + 'static,
{
    let (tx, output) = handoff_channel(ctx.buffer_size());
    let ctx = ctx.clone();
    let transform = Arc::new(transform);

    let task = tokio::spawn(async move {
        while let Some(item) = input.recv().await {
            let forwarded = match item {
                Ok(job) => {
                    let source_path = job.source_path().to_string();
                    let f = Arc::clone(&transform);

                    let start = Instant::now();
                    match run_blocking(stage, move || f(job)).await {
                        Ok(job) => {
                            ctx.telemetry
                                .stage_completed(stage, &source_path, start.elapsed());
                            Ok(job)
                        }
                        Err(cause) => {
                            Err(ctx.on_failure(JobFailure::new(stage, source_path, cause))?)
                        }
                    }
                }
                Err(upstream) => Err(upstream),
            };

            if tx.send(forwarded).await.is_err() {
                tracing::debug!("{} stage: downstream closed, stopping", stage);
                break;
            }
        }
        Ok::<(), JobFailure>(())
    });

    StageHandle {
        stage,
        output,
        task,
    }
}

/// Load stage: build a job for each source path and decode its image.
///
/// This is the only stage fed from a list rather than a channel; it suspends
/// only when its output is full.
pub fn load(sources: Vec<String>, ctx: &StageContext) -> StageHandle<StageItem> {
    const STAGE: StageKind = StageKind::Load;

    let (tx, output) = handoff_channel(ctx.buffer_size());
    let ctx = ctx.clone();
    let codec = ImageCodec::new(ctx.config.output.clone());

    let task = tokio::spawn(async move {
        for source in sources {
            let destination = match ctx.config.paths.destination_for(&source) {
                Ok(destination) => destination,
                Err(cause) => {
                    let failure = ctx.on_failure(JobFailure::new(STAGE, source, cause))?;
                    if tx.send(Err(failure)).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let codec = codec.clone();
            let path = source.clone();

            let start = Instant::now();
            let result = run_blocking(STAGE, move || codec.decode(Path::new(&path))).await;

            let item = match result {
                Ok(raster) => {
                    ctx.telemetry
                        .stage_completed(STAGE, &source, start.elapsed());
                    Ok(Job::new(source, destination, raster))
                }
                Err(cause) => Err(ctx.on_failure(JobFailure::new(STAGE, source, cause))?),
            };

            if tx.send(item).await.is_err() {
                tracing::debug!("load stage: downstream closed, stopping");
                break;
            }
        }
        Ok::<(), JobFailure>(())
    });

    StageHandle {
        stage: STAGE,
        output,
        task,
    }
}

/// Resize stage: replace each raster with its exact-size resample.
pub fn resize(input: mpsc::Receiver<StageItem>, ctx: &StageContext) -> StageHandle<StageItem> {
    let resizer = Resizer::new(&ctx.config.transform);
    spawn_job_stage(StageKind::Resize, input, ctx, move |job| {
        let raster = resizer.resize(&job.raster);
        Ok(job.with_raster(raster))
    })
}

/// Grayscale stage: replace each raster with its luminance image.
pub fn convert_to_grayscale(
    input: mpsc::Receiver<StageItem>,
    ctx: &StageContext,
) -> StageHandle<StageItem> {
    spawn_job_stage(StageKind::Grayscale, input, ctx, |job| {
        let raster = grayscale(&job.raster);
        Ok(job.with_raster(raster))
    })
}

/// Save stage: encode each raster to its destination and emit one terminal
/// signal per item. Upstream failures become `Err` signals.
pub fn save(mut input: mpsc::Receiver<StageItem>, ctx: &StageContext) -> StageHandle<SaveOutcome> {
    const STAGE: StageKind = StageKind::Save;

    let (tx, output) = handoff_channel(ctx.buffer_size());
    let ctx = ctx.clone();
    let codec = ImageCodec::new(ctx.config.output.clone());

    let task = tokio::spawn(async move {
        while let Some(item) = input.recv().await {
            let outcome = match item {
                Ok(job) => {
                    let source_path = job.source_path().to_string();
                    let codec = codec.clone();

                    let start = Instant::now();
                    let result = run_blocking(STAGE, move || {
                        codec.encode(&job.raster, job.destination_path())?;
                        let (width, height) = job.raster.dimensions();
                        Ok(SavedImage {
                            source_path: job.source_path().to_string(),
                            destination_path: job.destination_path().to_path_buf(),
                            width,
                            height,
                        })
                    })
                    .await;

                    match result {
                        Ok(saved) => {
                            ctx.telemetry
                                .stage_completed(STAGE, &source_path, start.elapsed());
                            Ok(saved)
                        }
                        Err(cause) => {
                            Err(ctx.on_failure(JobFailure::new(STAGE, source_path, cause))?)
                        }
                    }
                }
                Err(upstream) => Err(upstream),
            };

            if tx.send(outcome).await.is_err() {
                tracing::debug!("save stage: receiver closed, stopping");
                break;
            }
        }
        Ok::<(), JobFailure>(())
    });

    StageHandle {
        stage: STAGE,
        output,
        task,
    }
}
