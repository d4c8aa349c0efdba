use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::PipelineError;

type ErrorSlot<E> = Arc<Mutex<Option<E>>>;

/// A set of stage tasks sharing one cancellation token.
///
/// The first task to fail records its error and cancels the token; errors
/// reported after that (usually `Cancelled` from the remaining workers) are
/// discarded. Dropping the group cancels whatever is still running.
pub struct TaskGroup<E> {
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    first_error: ErrorSlot<E>,
}

impl<E> TaskGroup<E>
where
    E: From<PipelineError> + Display + Send + 'static,
{
    /// Creates a group whose token is a child of `parent`: cancelling the
    /// parent stops the group, a failure inside the group leaves the parent
    /// untouched.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: parent.child_token(),
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn spawn<F>(&mut self, stage: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let slot = Arc::clone(&self.first_error);
        self.tasks.spawn(async move {
            if let Err(err) = task.await {
                record_failure(&slot, &cancel, stage, err);
            }
        });
    }

    /// Runs a synchronous stage on the blocking pool.
    ///
    /// Blocking tasks cannot be aborted, so `task` must poll the group token
    /// (directly or through its hand-offs) to stop early.
    pub fn spawn_blocking<F>(&mut self, stage: &'static str, task: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let slot = Arc::clone(&self.first_error);
        self.tasks.spawn_blocking(move || {
            if let Err(err) = task() {
                record_failure(&slot, &cancel, stage, err);
            }
        });
    }

    /// Spawns a task whose value is handed back once the group has joined.
    pub fn spawn_output<T, F>(&mut self, stage: &'static str, task: F) -> TaskOutput<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.spawn(stage, async move {
            let value = task.await?;
            // The receiver only disappears when the caller gave up on the group.
            let _ = tx.send(value);
            Ok(())
        });
        TaskOutput { rx }
    }

    /// Joins every task. Returns the first recorded error, if any.
    pub async fn wait(mut self) -> Result<(), E> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(join_err) = joined {
                record_failure(
                    &self.first_error,
                    &self.cancel,
                    "join",
                    E::from(PipelineError::from(join_err)),
                );
            }
        }

        let first = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<E> Drop for TaskGroup<E> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn record_failure<E: Display>(
    slot: &Mutex<Option<E>>,
    cancel: &CancellationToken,
    stage: &'static str,
    err: E,
) {
    {
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            warn!("{stage} failed, cancelling pipeline: {err}");
            *guard = Some(err);
        } else {
            debug!("{stage} failed after cancellation: {err}");
        }
    }
    cancel.cancel();
}

/// Value produced by a task spawned with [`TaskGroup::spawn_output`].
pub struct TaskOutput<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> TaskOutput<T> {
    /// Only meaningful after [`TaskGroup::wait`] returned `Ok`.
    pub async fn take(self) -> Result<T, PipelineError> {
        self.rx.await.map_err(|_| PipelineError::ChannelClosed)
    }
}
