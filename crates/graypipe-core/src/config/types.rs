//! Sub-configuration structs with defaults matching the reference benchmark.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PipelineResult;
use crate::types::derive_destination;

/// Source list and output path derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Ordered list of images to process
    pub sources: Vec<String>,

    /// Path segment identifying the input directory
    pub input_segment: String,

    /// Replacement segment for output paths
    pub output_segment: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                "images/image1.jpeg".to_string(),
                "images/image2.jpeg".to_string(),
                "images/image3.jpeg".to_string(),
                "images/image4.jpeg".to_string(),
            ],
            input_segment: "images/".to_string(),
            output_segment: "images/output/".to_string(),
        }
    }
}

impl PathsConfig {
    /// Destination path for a given source.
    pub fn destination_for(&self, source: &str) -> PipelineResult<PathBuf> {
        derive_destination(source, &self.input_segment, &self.output_segment)
    }
}

/// What a stage does when one image fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first failure
    #[default]
    Abort,
    /// Forward the failure as a `false` terminal signal and keep going
    Skip,
}

/// Channel and failure settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of each inter-stage channel (1 is the closest to a rendezvous)
    pub buffer_size: usize,

    /// Behaviour when a job fails in any stage
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// Resampling filter used by the resize stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Resize stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Resampling filter
    pub filter: ResizeFilter,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            filter: ResizeFilter::Lanczos3,
        }
    }
}

/// Output image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Create the destination directory when it does not exist
    pub create_dirs: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 75,
            create_dirs: true,
        }
    }
}

/// Which interval the report's time line covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureWindow {
    /// From the Load call until Save is wired (construction only)
    #[default]
    Wiring,
    /// From the Load call until the last terminal signal is drained
    Drain,
}

/// Report file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Path of the two-line report file
    pub path: String,

    /// Interval reported as pipeline throughput time
    pub measure: MeasureWindow,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: "dataPipelinesWithConcurrencyOutput.txt".to_string(),
            measure: MeasureWindow::Wiring,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,

    /// Append-only telemetry log file (empty disables the file sink)
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: "logOutput.txt".to_string(),
        }
    }
}
