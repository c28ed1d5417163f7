use std::io;
use std::sync::Arc;

use tracing::info;

use crate::config::BrokerConfig;
use crate::flush::FlushScheduler;
use crate::queue_manager::QueueManager;
use crate::recovery::{recover_queues, RecoveryReport};
use crate::registry::QueueRegistry;
use crate::wal::LogDirectory;

/// A running broker: the recovered queues plus the flush task.
pub struct Broker {
    queue_manager: QueueManager,
    flush_scheduler: FlushScheduler,
    recovery_report: RecoveryReport,
}

impl Broker {
    /// Recovers the queues stored in the configured directory, then starts
    /// the flush task.
    ///
    /// Queues can be served as soon as this returns.
    pub async fn open(config: &BrokerConfig) -> io::Result<Broker> {
        tokio::fs::create_dir_all(&config.logs_path).await?;
        let directory = LogDirectory::new(&config.logs_path);
        let registry = Arc::new(QueueRegistry::default());
        let recovery_report =
            recover_queues(&directory, &registry, config.segment_threshold).await?;
        let flush_scheduler = FlushScheduler::start(registry.clone(), config.flush_interval());
        let queue_manager = QueueManager::new(directory, registry, config.segment_threshold);
        info!(path = %config.logs_path.display(), "broker ready");
        Ok(Broker {
            queue_manager,
            flush_scheduler,
            recovery_report,
        })
    }

    pub fn queue_manager(&self) -> &QueueManager {
        &self.queue_manager
    }

    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery_report
    }

    /// Stops the flush task after a last flush of every queue.
    pub async fn shutdown(self) {
        self.flush_scheduler.shutdown().await;
        info!("broker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::QueueIdentity;

    fn config(logs_path: &std::path::Path) -> BrokerConfig {
        BrokerConfig {
            logs_path: logs_path.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_broker_creates_directory() {
        let tempdir = tempfile::tempdir().unwrap();
        let logs_path = tempdir.path().join("nested").join("logs");
        let broker = Broker::open(&config(&logs_path)).await.unwrap();
        assert!(logs_path.is_dir());
        assert!(broker.recovery_report().recovered.is_empty());
        broker.shutdown().await;
    }

    #[tokio::test]
    async fn test_broker_reopen() {
        let tempdir = tempfile::tempdir().unwrap();
        {
            let broker = Broker::open(&config(tempdir.path())).await.unwrap();
            let queue_manager = broker.queue_manager();
            queue_manager.create("app", "q", 0, 0).await.unwrap();
            queue_manager.enqueue("app", "q", "one").await.unwrap();
            queue_manager.enqueue("app", "q", "two").await.unwrap();
            broker.shutdown().await;
        }
        {
            let broker = Broker::open(&config(tempdir.path())).await.unwrap();
            assert_eq!(
                broker.recovery_report().recovered,
                vec![QueueIdentity::new("app", "q")]
            );
            let queue_manager = broker.queue_manager();
            assert_eq!(queue_manager.dequeue("app", "q").await.unwrap(), "one");
            assert_eq!(queue_manager.dequeue("app", "q").await.unwrap(), "two");
            broker.shutdown().await;
        }
    }
}
