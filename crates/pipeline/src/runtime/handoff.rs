use async_channel as chan;
use tokio_util::sync::CancellationToken;

use super::flow_control::FlowControlConfig;
use crate::error::PipelineError;

/// Opens a bounded multi-producer, multi-consumer hand-off between two stages.
///
/// The channel closes once every sender clone is dropped, which is how a
/// stage signals completion to the next one.
pub fn handoff<T>(
    flow: &FlowControlConfig,
    cancel: &CancellationToken,
) -> (StageSender<T>, StageReceiver<T>) {
    let (tx, rx) = chan::bounded(flow.capacity());
    (
        StageSender {
            tx,
            cancel: cancel.clone(),
        },
        StageReceiver {
            rx,
            cancel: cancel.clone(),
        },
    )
}

pub struct StageSender<T> {
    tx: chan::Sender<T>,
    cancel: CancellationToken,
}

impl<T> Clone for StageSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> StageSender<T> {
    pub async fn send(&self, item: T) -> Result<(), PipelineError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            sent = self.tx.send(item) => sent.map_err(|_| self.closed_error()),
        }
    }

    /// Blocking variant for producers running on the blocking pool.
    ///
    /// A blocked producer is released when every receiver is dropped, which
    /// happens once the downstream workers observe cancellation.
    pub fn send_blocking(&self, item: T) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        self.tx.send_blocking(item).map_err(|_| self.closed_error())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn closed_error(&self) -> PipelineError {
        if self.cancel.is_cancelled() {
            PipelineError::Cancelled
        } else {
            PipelineError::ChannelClosed
        }
    }
}

pub struct StageReceiver<T> {
    rx: chan::Receiver<T>,
    cancel: CancellationToken,
}

impl<T> Clone for StageReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> StageReceiver<T> {
    /// Returns `Ok(None)` once the upstream stage has finished.
    pub async fn recv(&self) -> Result<Option<T>, PipelineError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            item = self.rx.recv() => Ok(item.ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_returns_none_after_senders_drop() {
        let cancel = CancellationToken::new();
        let (tx, rx) = handoff::<u32>(&FlowControlConfig::default(), &cancel);

        let producer = tokio::spawn(async move {
            tx.send(1).await.unwrap();
            tx.send(2).await.unwrap();
        });

        assert_eq!(rx.recv().await.unwrap(), Some(1));
        assert_eq!(rx.recv().await.unwrap(), Some(2));
        producer.await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blocked_send_observes_cancellation() {
        let cancel = CancellationToken::new();
        let (tx, _rx) = handoff::<u32>(&FlowControlConfig::default(), &cancel);

        // Fills the single slot; the second send has nowhere to go.
        tx.send(1).await.unwrap();

        let pending = {
            let tx = tx.clone();
            tokio::spawn(async move { tx.send(2).await })
        };
        cancel.cancel();

        assert_eq!(pending.await.unwrap(), Err(PipelineError::Cancelled));
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let cancel = CancellationToken::new();
        let (tx, rx) = handoff::<u32>(&FlowControlConfig::with_capacity(0), &cancel);

        tx.send(7).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Some(7));
    }
}
