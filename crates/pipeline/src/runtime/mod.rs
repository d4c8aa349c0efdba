use std::future::Future;

use crate::error::PipelineError;
use crate::traits::Reducer;

pub mod flow_control;
pub mod group;
pub mod handoff;

pub use flow_control::FlowControlConfig;
pub use group::{TaskGroup, TaskOutput};
pub use handoff::{StageReceiver, StageSender, handoff};

/// Drains `rx` into `reducer` until every sender is gone, then finishes it.
///
/// Cancellation is observed on every receive, so a failed pipeline never
/// yields a partial reduction.
pub fn drain<T, R>(
    rx: StageReceiver<T>,
    mut reducer: R,
) -> impl Future<Output = Result<R::Output, R::Error>> + Send
where
    T: Send + 'static,
    R: Reducer<T> + 'static,
{
    async move {
        while let Some(item) = rx.recv().await.map_err(R::Error::from)? {
            reducer.accept(item)?;
        }
        Ok(reducer.finish())
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Join(err.to_string())
    }
}
