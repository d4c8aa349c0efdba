use crate::error::PipelineError;

/// Single-consumer aggregator at the tail of a stage.
///
/// Only one task ever owns a reducer, so `accept` takes `&mut self` and no
/// locking is involved.
pub trait Reducer<T>: Send {
    type Output: Send;
    type Error: From<PipelineError> + Send;

    fn accept(&mut self, item: T) -> Result<(), Self::Error>;

    fn finish(self) -> Self::Output;
}
