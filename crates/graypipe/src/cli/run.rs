//! The `graypipe run` command.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use graypipe_core::{Config, FailurePolicy, MeasureWindow, Pipeline, ReportWriter};

/// Interval reported on the report's time line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Measure {
    /// Pipeline construction only (Load call until Save is wired)
    Wiring,
    /// Until the last terminal signal is drained
    Drain,
}

impl From<Measure> for MeasureWindow {
    fn from(measure: Measure) -> Self {
        match measure {
            Measure::Wiring => MeasureWindow::Wiring,
            Measure::Drain => MeasureWindow::Drain,
        }
    }
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Image paths to process, in order (defaults to paths.sources)
    pub sources: Vec<String>,

    /// Report file (overrides report.path)
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Report failed images as `false` signals instead of aborting
    #[arg(long)]
    pub keep_going: bool,

    /// Capacity of each inter-stage channel
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// JPEG quality for output images (1-100)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Interval reported as pipeline throughput time
    #[arg(long, value_enum)]
    pub measure: Option<Measure>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Fold command-line overrides into the loaded configuration.
fn apply_overrides(args: &RunArgs, config: &mut Config) -> anyhow::Result<()> {
    if !args.sources.is_empty() {
        config.paths.sources = args.sources.clone();
    }
    if let Some(report) = &args.report {
        config.report.path = report.to_string_lossy().into_owned();
    }
    if args.keep_going {
        config.pipeline.failure_policy = FailurePolicy::Skip;
    }
    if let Some(buffer_size) = args.buffer_size {
        config.pipeline.buffer_size = buffer_size;
    }
    if let Some(quality) = args.quality {
        config.output.jpeg_quality = quality;
    }
    if let Some(measure) = args.measure {
        config.report.measure = measure.into();
    }
    config.validate()?;
    Ok(())
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config)?;

    if config.paths.sources.is_empty() {
        tracing::warn!("No source images configured");
        return Ok(());
    }

    // A missing report file ends the run quietly rather than failing it
    let report_path = config.report_path();
    let mut report = match ReportWriter::create(&report_path, config.report.measure) {
        Ok(writer) => writer,
        Err(e) => {
            tracing::error!("Error creating output file {:?}: {}", report_path, e);
            return Ok(());
        }
    };

    tracing::info!("Processing {} image(s)", config.paths.sources.len());
    let pipeline = Pipeline::with_tracing(config);
    let summary = pipeline.run().await?;

    report.write_metrics(&summary.metrics)?;
    tracing::info!("Report written to {:?}", report_path);

    let metrics = &summary.metrics;
    if metrics.failed > 0 {
        tracing::warn!(
            "{} of {} image(s) failed",
            metrics.failed,
            metrics.succeeded + metrics.failed
        );
    }
    tracing::info!(
        "Done: {} succeeded in {:?} ({} bytes allocated)",
        metrics.succeeded,
        metrics.total_time,
        metrics.memory_allocated
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
