//! Plain-text run report.
//!
//! The report holds exactly two lines, the pipeline time in microseconds and
//! the bytes allocated during the run:
//!
//! ```text
//! Total Pipeline Throughput Time: 1234 microseconds
//! Total Memory Used: 56789 bytes
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::config::MeasureWindow;
use crate::types::PipelineMetrics;

const TIME_PREFIX: &str = "Total Pipeline Throughput Time:";
const MEMORY_PREFIX: &str = "Total Memory Used:";

/// Writes the two-line report to any writer.
pub struct ReportWriter<W: Write> {
    writer: W,
    window: MeasureWindow,
}

impl ReportWriter<BufWriter<File>> {
    /// Create (or truncate) the report file.
    pub fn create(path: &Path, window: MeasureWindow) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), window))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W, window: MeasureWindow) -> Self {
        Self { writer, window }
    }

    /// Write both report lines and flush.
    pub fn write_metrics(&mut self, metrics: &PipelineMetrics) -> io::Result<()> {
        let elapsed = throughput_time(metrics, self.window);
        writeln!(
            self.writer,
            "{} {} microseconds",
            TIME_PREFIX,
            elapsed.as_micros()
        )?;
        writeln!(
            self.writer,
            "{} {} bytes",
            MEMORY_PREFIX, metrics.memory_allocated
        )?;
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// The interval reported on the time line for the chosen window.
pub fn throughput_time(metrics: &PipelineMetrics, window: MeasureWindow) -> Duration {
    match window {
        MeasureWindow::Wiring => metrics.wiring_time,
        MeasureWindow::Drain => metrics.total_time,
    }
}

/// Values read back from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportValues {
    pub time_us: u128,
    pub memory_bytes: u64,
}

/// Parse a report produced by [`ReportWriter`].
pub fn parse_report(text: &str) -> Option<ReportValues> {
    let mut lines = text.lines();
    let time_us = number_after(lines.next()?, TIME_PREFIX)?;
    let memory_bytes = number_after(lines.next()?, MEMORY_PREFIX)?;
    Some(ReportValues {
        time_us,
        memory_bytes,
    })
}

fn number_after<T: std::str::FromStr>(line: &str, prefix: &str) -> Option<T> {
    line.strip_prefix(prefix)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}
