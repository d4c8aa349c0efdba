use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use unrealscope_pipeline::{
    FlowControlConfig, PipelineError, Reducer, TaskGroup, drain, handoff,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum TestError {
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("boom at {0}")]
    Boom(u32),
}

#[derive(Default)]
struct SumReducer {
    total: u64,
    seen: usize,
}

impl Reducer<u32> for SumReducer {
    type Output = (u64, usize);
    type Error = TestError;

    fn accept(&mut self, item: u32) -> Result<(), TestError> {
        self.total += u64::from(item);
        self.seen += 1;
        Ok(())
    }

    fn finish(self) -> (u64, usize) {
        (self.total, self.seen)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_producer_pool_reducer_roundtrip() {
    let root = CancellationToken::new();
    let mut group = TaskGroup::<TestError>::new(&root);
    let token = group.token();
    let flow = FlowControlConfig::default();

    let (numbers_tx, numbers_rx) = handoff::<u32>(&flow, &token);
    let (doubled_tx, doubled_rx) = handoff::<u32>(&flow, &token);

    group.spawn("producer", async move {
        for n in 1..=100 {
            numbers_tx.send(n).await?;
        }
        Ok(())
    });

    for _ in 0..8 {
        let rx = numbers_rx.clone();
        let tx = doubled_tx.clone();
        group.spawn("doubler", async move {
            while let Some(n) = rx.recv().await? {
                tx.send(n * 2).await?;
            }
            Ok(())
        });
    }
    drop(numbers_rx);
    drop(doubled_tx);

    let output = group.spawn_output("reducer", drain(doubled_rx, SumReducer::default()));

    group.wait().await.unwrap();
    let (total, seen) = output.take().await.unwrap();
    assert_eq!(seen, 100);
    assert_eq!(total, 2 * (1..=100u64).sum::<u64>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_first_error_wins_and_cancels_siblings() {
    let root = CancellationToken::new();
    let mut group = TaskGroup::<TestError>::new(&root);
    let token = group.token();
    let (tx, rx) = handoff::<u32>(&FlowControlConfig::default(), &token);
    let cancelled_workers = Arc::new(AtomicUsize::new(0));

    // Nobody consumes, so this producer parks on its second send.
    group.spawn("producer", async move {
        for n in 0u32.. {
            tx.send(n).await?;
        }
        Ok(())
    });

    for _ in 0..4 {
        let counter = Arc::clone(&cancelled_workers);
        let token = token.clone();
        group.spawn("idle", async move {
            token.cancelled().await;
            counter.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Pipeline(PipelineError::Cancelled))
        });
    }

    group.spawn("failing", async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err(TestError::Boom(7))
    });

    let result = group.wait().await;
    assert_eq!(result, Err(TestError::Boom(7)));
    assert_eq!(cancelled_workers.load(Ordering::SeqCst), 4);
    assert!(!root.is_cancelled(), "failures must not leak into the parent");
    drop(rx);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parent_cancellation_stops_group() {
    let root = CancellationToken::new();
    let mut group = TaskGroup::<TestError>::new(&root);
    let token = group.token();
    let (tx, _rx) = handoff::<u32>(&FlowControlConfig::default(), &token);

    group.spawn("producer", async move {
        for n in 0u32.. {
            tx.send(n).await?;
        }
        Ok(())
    });

    root.cancel();
    assert_eq!(
        group.wait().await,
        Err(TestError::Pipeline(PipelineError::Cancelled))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_producer_released_when_consumers_stop() {
    let root = CancellationToken::new();
    let mut group = TaskGroup::<TestError>::new(&root);
    let token = group.token();
    let (tx, rx) = handoff::<u32>(&FlowControlConfig::default(), &token);

    group.spawn_blocking("walker", move || {
        for n in 0u32.. {
            tx.send_blocking(n)?;
        }
        Ok(())
    });

    group.spawn("consumer", async move {
        let first = rx.recv().await?;
        assert_eq!(first, Some(0));
        Err(TestError::Boom(1))
    });

    assert_eq!(group.wait().await, Err(TestError::Boom(1)));
}

#[tokio::test]
#[allow(unreachable_code)]
async fn test_panicking_task_surfaces_as_join_error() {
    let root = CancellationToken::new();
    let mut group = TaskGroup::<TestError>::new(&root);

    group.spawn("panicky", async move {
        panic!("stage exploded");
        Ok(())
    });

    match group.wait().await {
        Err(TestError::Pipeline(PipelineError::Join(msg))) => assert!(msg.contains("panic")),
        other => panic!("unexpected result: {other:?}"),
    }
}
