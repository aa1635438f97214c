//! graypipe core - a fixed, concurrent image pipeline.
//!
//! Every source image flows through four stages, each running as its own
//! task and connected to the next by a handoff channel:
//!
//! ```text
//! paths → Load → Resize (500×500) → Grayscale → Save → terminal signals
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use graypipe_core::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> graypipe_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = Pipeline::with_tracing(config);
//!
//!     let summary = pipeline.run().await?;
//!     println!("{} images saved", summary.metrics.succeeded);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod report;
pub mod types;

// Re-exports for convenient access
pub use config::{Config, FailurePolicy, MeasureWindow};
pub use error::{ConfigError, GraypipeError, JobFailure, PipelineError, PipelineResult, Result};
pub use memory::CountingAllocator;
pub use pipeline::{Pipeline, Telemetry, TracingTelemetry};
pub use report::ReportWriter;
pub use types::{Job, PipelineMetrics, RunSummary, SaveOutcome, StageKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_with_tracing() {
        let pipeline = Pipeline::with_tracing(Config::default());
        assert_eq!(pipeline.config().transform.width, 500);
        let summary = pipeline.run_sources(vec![]).await.unwrap();
        assert!(summary.outcomes.is_empty());
    }
}
