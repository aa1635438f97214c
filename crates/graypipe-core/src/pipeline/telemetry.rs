//! Telemetry sink injected into every stage and the orchestrator.
//!
//! Stages report per-item transform latency; the orchestrator reports each
//! terminal signal. Recording is infallible so telemetry can never interrupt
//! the dataflow.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::types::{SaveOutcome, StageKind};

/// Receiver for pipeline telemetry. Implementations must tolerate concurrent
/// calls from all four stage workers.
pub trait Telemetry: Send + Sync {
    /// A run is starting with `sources` images.
    fn run_started(&self, sources: usize);

    /// One stage finished its transform for one job.
    fn stage_completed(&self, stage: StageKind, source_path: &str, elapsed: Duration);

    /// The orchestrator drained one terminal signal.
    fn job_finished(&self, outcome: &SaveOutcome);
}

/// Default sink: emits `tracing` events at INFO level.
///
/// The subscriber decides where they go; the CLI routes them to the
/// append-only log file through a single mutex-guarded writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn run_started(&self, sources: usize) {
        tracing::info!(sources, "Pipeline started");
    }

    fn stage_completed(&self, stage: StageKind, source_path: &str, elapsed: Duration) {
        tracing::info!(
            stage = %stage,
            elapsed_us = elapsed.as_micros() as u64,
            "Image {} in: {:?} for path: {}",
            stage.verb(),
            elapsed,
            source_path
        );
    }

    fn job_finished(&self, outcome: &SaveOutcome) {
        match outcome {
            Ok(saved) => tracing::info!(
                path = %saved.source_path,
                "Success! Image processing completed."
            ),
            Err(failure) => tracing::info!(
                path = %failure.source_path,
                error = %failure.cause,
                "Failed! Image processing failed."
            ),
        }
    }
}

/// A telemetry event captured by [`RecordingTelemetry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    RunStarted { sources: usize },
    StageCompleted { stage: StageKind, source_path: String },
    JobFinished { source_path: String, success: bool },
}

/// In-memory sink that keeps every event, for tests and embedding callers.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.lock().clone()
    }

    /// Source paths of stage completions for `stage`, in recording order.
    pub fn stage_sequence(&self, stage: StageKind) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::StageCompleted {
                    stage: s,
                    source_path,
                } if *s == stage => Some(source_path.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TelemetryEvent>> {
        // A poisoned lock still holds valid events
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Telemetry for RecordingTelemetry {
    fn run_started(&self, sources: usize) {
        self.lock().push(TelemetryEvent::RunStarted { sources });
    }

    fn stage_completed(&self, stage: StageKind, source_path: &str, _elapsed: Duration) {
        self.lock().push(TelemetryEvent::StageCompleted {
            stage,
            source_path: source_path.to_string(),
        });
    }

    fn job_finished(&self, outcome: &SaveOutcome) {
        let (source_path, success) = match outcome {
            Ok(saved) => (saved.source_path.clone(), true),
            Err(failure) => (failure.source_path.clone(), false),
        };
        self.lock().push(TelemetryEvent::JobFinished {
            source_path,
            success,
        });
    }
}
