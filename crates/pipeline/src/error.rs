use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("pipeline cancelled")]
    Cancelled,
    #[error("stage hand-off closed unexpectedly")]
    ChannelClosed,
    #[error("stage task join failure: {0}")]
    Join(String),
}
