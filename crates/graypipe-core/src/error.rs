//! Error types for the graypipe image pipeline.
//!
//! Errors are organized by concern: configuration, per-stage pipeline failures,
//! and the tagged [`JobFailure`] that travels down the channel chain when a
//! single image cannot be processed.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::StageKind;

/// Top-level error type for graypipe operations.
#[derive(Error, Debug)]
pub enum GraypipeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline wiring or runtime errors not tied to a single image
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A single image failed and the run was aborted
    #[error("Run aborted: {0}")]
    Job(#[from] JobFailure),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading a source or writing a destination failed
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// The source path does not contain the input segment
    #[error("Cannot derive destination for {path}: missing segment {segment:?}")]
    PathDerivation { path: String, segment: String },

    /// A stage worker panicked or was cancelled
    #[error("{stage} stage task failed: {message}")]
    TaskFailed { stage: StageKind, message: String },
}

/// A failure bound to one image, tagged with the stage that produced it.
///
/// Under the `skip` policy this value is forwarded through the remaining
/// stages in place of the job so every source still yields a terminal signal.
#[derive(Error, Debug)]
#[error("{stage} failed for {source_path}: {cause}")]
pub struct JobFailure {
    /// Stage where the failure happened
    pub stage: StageKind,
    /// Source path of the job
    pub source_path: String,
    /// Underlying error
    #[source]
    pub cause: PipelineError,
}

impl JobFailure {
    pub fn new(stage: StageKind, source_path: impl Into<String>, cause: PipelineError) -> Self {
        Self {
            stage,
            source_path: source_path.into(),
            cause,
        }
    }
}

/// Convenience type alias for graypipe results.
pub type Result<T> = std::result::Result<T, GraypipeError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
