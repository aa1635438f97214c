//! Core data types for the graypipe pipeline.
//!
//! A [`Job`] is created by the load stage and moved through every channel of
//! the chain; the save stage turns it into a [`SaveOutcome`].

use image::DynamicImage;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{JobFailure, PipelineError, PipelineResult};

/// The four fixed stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Load,
    Resize,
    Grayscale,
    Save,
}

impl StageKind {
    /// Past-tense verb used in telemetry lines ("Image resized in ...").
    pub fn verb(self) -> &'static str {
        match self {
            StageKind::Load => "loaded",
            StageKind::Resize => "resized",
            StageKind::Grayscale => "converted to grayscale",
            StageKind::Save => "saved",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Load => write!(f, "load"),
            StageKind::Resize => write!(f, "resize"),
            StageKind::Grayscale => write!(f, "grayscale"),
            StageKind::Save => write!(f, "save"),
        }
    }
}

/// One image in flight.
///
/// `source_path` and `destination_path` are fixed at construction; only the
/// raster is swapped out as the job moves from stage to stage.
#[derive(Debug)]
pub struct Job {
    source_path: String,
    destination_path: PathBuf,
    /// Current image payload, always a complete raster between stages
    pub raster: DynamicImage,
}

impl Job {
    /// Create a job for a decoded source image.
    pub fn new(
        source_path: impl Into<String>,
        destination_path: PathBuf,
        raster: DynamicImage,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            destination_path,
            raster,
        }
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    /// Replace the raster with a transform's output.
    pub fn with_raster(self, raster: DynamicImage) -> Self {
        Self { raster, ..self }
    }
}

/// Derive the output path by replacing the first occurrence of
/// `input_segment` in `source` with `output_segment`.
///
/// A source that does not contain the input segment is rejected rather than
/// mapped onto itself, so the original file can never be overwritten.
pub fn derive_destination(
    source: &str,
    input_segment: &str,
    output_segment: &str,
) -> PipelineResult<PathBuf> {
    if input_segment.is_empty() || !source.contains(input_segment) {
        return Err(PipelineError::PathDerivation {
            path: source.to_string(),
            segment: input_segment.to_string(),
        });
    }
    Ok(PathBuf::from(source.replacen(
        input_segment,
        output_segment,
        1,
    )))
}

/// Element type of every job-carrying channel.
pub type StageItem = std::result::Result<Job, JobFailure>;

/// A successfully written output image.
#[derive(Debug, Clone, Serialize)]
pub struct SavedImage {
    pub source_path: String,
    pub destination_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Terminal signal emitted by the save stage, one per source path.
///
/// `outcome.is_ok()` is the boolean success flag.
pub type SaveOutcome = std::result::Result<SavedImage, JobFailure>;

fn serialize_micros<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_micros() as u64)
}

/// Whole-run measurements, computed once per run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    /// Time spent constructing the stage chain (Load call to Save wired)
    #[serde(rename = "wiring_time_us", serialize_with = "serialize_micros")]
    pub wiring_time: Duration,

    /// Time from the start of wiring until the terminal channel closed
    #[serde(rename = "total_time_us", serialize_with = "serialize_micros")]
    pub total_time: Duration,

    /// Bytes allocated process-wide between the first and last sample
    pub memory_allocated: u64,

    /// Number of `true` terminal signals
    pub succeeded: usize,

    /// Number of `false` terminal signals
    pub failed: usize,
}

/// Serializable view of one terminal signal.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub source_path: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SaveOutcome> for OutcomeRecord {
    fn from(outcome: &SaveOutcome) -> Self {
        match outcome {
            Ok(saved) => Self {
                source_path: saved.source_path.clone(),
                success: true,
                destination_path: Some(saved.destination_path.clone()),
                error: None,
            },
            Err(failure) => Self {
                source_path: failure.source_path.clone(),
                success: false,
                destination_path: None,
                error: Some(failure.to_string()),
            },
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub metrics: PipelineMetrics,
    /// Terminal signals in the order they were drained
    pub outcomes: Vec<OutcomeRecord>,
}

impl RunSummary {
    /// True when every terminal signal reported success.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }
}
