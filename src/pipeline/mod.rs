//! Lead fulfillment pipeline: the orchestrator state machine and the
//! retry pass.

pub mod orchestrator;
pub mod retry;

pub use orchestrator::{Orchestrator, PipelineReport, RecordError};
pub use retry::retry_failed;
