use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::registry::QueueRegistry;

/// Interval between two flushes of all the queue files.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(20);

/// Background task forcing the open segment and checkpoint files of every
/// registered queue to stable storage, at a fixed interval.
///
/// Appends and move heads hand their writes over to the OS but do not sync
/// them: the scheduler bounds how much can be lost on a power failure.
pub struct FlushScheduler {
    cancel_token: CancellationToken,
    join_handle: JoinHandle<()>,
}

impl FlushScheduler {
    /// Spawns the flush task. Must be called from within a tokio runtime.
    pub fn start(registry: Arc<QueueRegistry>, period: Duration) -> FlushScheduler {
        let cancel_token = CancellationToken::new();
        let join_handle = tokio::spawn(run_flush_loop(registry, period, cancel_token.clone()));
        FlushScheduler {
            cancel_token,
            join_handle,
        }
    }

    /// Stops the task. A last flush pass runs before it exits.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        if let Err(join_error) = self.join_handle.await {
            warn!(error = %join_error, "flush task failed");
        }
    }
}

async fn run_flush_loop(
    registry: Arc<QueueRegistry>,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                flush_all(&registry).await;
            }
            _ = cancel_token.cancelled() => {
                break;
            }
        }
    }
    flush_all(&registry).await;
}

/// Flushes the checkpoint and active segment of every registered queue.
///
/// Failures are logged and do not stop the pass. Returns the number of
/// files that failed to flush.
pub async fn flush_all(registry: &QueueRegistry) -> usize {
    let queues = registry.snapshot();
    debug!(num_queues = queues.len(), "saving files to disk");
    let mut num_failures = 0;
    for queue in queues {
        if let Err(io_error) = queue.flush_checkpoint().await {
            warn!(queue = %queue.identity(), error = %io_error, "failed to flush checkpoint");
            num_failures += 1;
        }
        if let Err(io_error) = queue.flush_segment().await {
            warn!(queue = %queue.identity(), error = %io_error, "failed to flush segment");
            num_failures += 1;
        }
    }
    debug!(num_failures, "finished saving files to disk");
    num_failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_queue::LiveQueue;
    use crate::metadata::{QueueIdentity, QueueMetadata};
    use crate::wal::{LogDirectory, QueueLog, DEFAULT_SEGMENT_THRESHOLD};

    async fn registry_with_queue(dir: &std::path::Path) -> Arc<QueueRegistry> {
        let metadata = QueueMetadata::new(&QueueIdentity::new("app", "q"), 0, 0);
        let queue_log = QueueLog::create(
            LogDirectory::new(dir),
            metadata,
            DEFAULT_SEGMENT_THRESHOLD,
        )
        .await
        .unwrap();
        let registry = Arc::new(QueueRegistry::default());
        registry.insert(Arc::new(LiveQueue::new(queue_log))).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_flush_all() {
        let tempdir = tempfile::tempdir().unwrap();
        let registry = registry_with_queue(tempdir.path()).await;
        let queue = registry.get(&QueueIdentity::new("app", "q")).unwrap();
        queue.append("hello").await.unwrap();
        assert_eq!(flush_all(&registry).await, 0);
        assert_eq!(flush_all(&QueueRegistry::default()).await, 0);
    }

    #[tokio::test]
    async fn test_flush_scheduler_shutdown_does_not_wait_for_period() {
        let tempdir = tempfile::tempdir().unwrap();
        let registry = registry_with_queue(tempdir.path()).await;
        let flush_scheduler = FlushScheduler::start(registry, Duration::from_secs(3_600));
        tokio::time::timeout(Duration::from_secs(5), flush_scheduler.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_flush_scheduler_ticks() {
        let tempdir = tempfile::tempdir().unwrap();
        let registry = registry_with_queue(tempdir.path()).await;
        let flush_scheduler = FlushScheduler::start(registry.clone(), Duration::from_millis(10));
        let queue = registry.get(&QueueIdentity::new("app", "q")).unwrap();
        for _ in 0..5 {
            queue.append("hello").await.unwrap();
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        flush_scheduler.shutdown().await;
        assert_eq!(queue.len().await, 5);
    }
}
