//! The concurrent image pipeline.
//!
//! - **stages**: the four stage generators (load, resize, grayscale, save)
//! - **orchestrator**: wires the chain, drains terminal signals, measures
//! - **channel**: single-producer/single-consumer handoff channels
//! - **telemetry**: injected sink for per-item timing and terminal signals
//! - **codec**: image decode and JPEG encode
//! - **transform**: exact resize and grayscale conversion

pub mod channel;
pub mod codec;
pub mod orchestrator;
pub mod stages;
pub mod telemetry;
pub mod transform;

// Re-exports for convenient access
pub use channel::{handoff_channel, StageHandle, StageTask};
pub use codec::ImageCodec;
pub use orchestrator::Pipeline;
pub use stages::StageContext;
pub use telemetry::{RecordingTelemetry, Telemetry, TelemetryEvent, TracingTelemetry};
pub use transform::{grayscale, Resizer};
