//! Handoff channels linking one stage to the next.
//!
//! Every channel has exactly one producer (the upstream stage worker) and one
//! consumer (the downstream worker or the orchestrator). A full channel blocks
//! the producer's `send`, which is the pipeline's only flow control.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::JobFailure;
use crate::types::StageKind;

/// Create the channel pair for one stage's output.
///
/// tokio channels need a capacity of at least one, so the tightest handoff
/// available holds a single item in flight.
pub fn handoff_channel<T>(buffer_size: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(buffer_size.max(1))
}

/// The running half of a stage: its output receiver plus its worker task.
///
/// The worker returns `Err` only under the abort policy, carrying the failure
/// that stopped it.
pub struct StageHandle<T> {
    pub stage: StageKind,
    pub output: mpsc::Receiver<T>,
    pub task: JoinHandle<Result<(), JobFailure>>,
}

impl<T> StageHandle<T> {
    /// Split into the output receiver and a named worker handle.
    pub fn into_parts(self) -> (mpsc::Receiver<T>, StageTask) {
        (
            self.output,
            StageTask {
                stage: self.stage,
                task: self.task,
            },
        )
    }
}

/// A stage worker detached from its output channel.
pub struct StageTask {
    pub stage: StageKind,
    pub task: JoinHandle<Result<(), JobFailure>>,
}
