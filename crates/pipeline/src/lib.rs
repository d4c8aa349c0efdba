//! Streaming stage runtime used by the indexing pipeline.
//!
//! Stages are pools of tasks connected by bounded hand-offs. A fast stage
//! blocks on its output until the next stage consumes, and every hand-off
//! observes the shared cancellation token, so the first failure anywhere
//! stops every stage.

pub mod error;
pub mod runtime;
pub mod traits;

pub use error::PipelineError;
pub use runtime::{
    FlowControlConfig, StageReceiver, StageSender, TaskGroup, TaskOutput, drain, handoff,
};
pub use traits::Reducer;
