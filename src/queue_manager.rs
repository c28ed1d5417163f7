use std::io;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::QueueError;
use crate::live_queue::LiveQueue;
use crate::metadata::{QueueIdentity, QueueMetadata};
use crate::registry::QueueRegistry;
use crate::wal::{LogDirectory, QueueLog};

/// Implements create, enqueue, dequeue and peek on top of the registry.
pub struct QueueManager {
    directory: LogDirectory,
    registry: Arc<QueueRegistry>,
    segment_threshold: u64,
}

impl QueueManager {
    pub fn new(
        directory: LogDirectory,
        registry: Arc<QueueRegistry>,
        segment_threshold: u64,
    ) -> QueueManager {
        QueueManager {
            directory,
            registry,
            segment_threshold,
        }
    }

    pub fn registry(&self) -> &Arc<QueueRegistry> {
        &self.registry
    }

    fn live_queue(&self, queue: &QueueIdentity) -> Result<Arc<LiveQueue>, QueueError> {
        self.registry
            .get(queue)
            .ok_or_else(|| QueueError::QueueDoesNotExist {
                queue: queue.clone(),
            })
    }

    /// Creates a new queue.
    ///
    /// Delay and visibility timeout values above 30 are reset to 0.
    /// Returns an error if the queue already exists, or if a queue sharing
    /// the same file names exists on disk.
    pub async fn create(
        &self,
        app_name: &str,
        name: &str,
        delay_seconds: u32,
        visibility_timeout: u32,
    ) -> Result<(), QueueError> {
        let queue = QueueIdentity::new(app_name, name);
        if !queue.is_valid() {
            debug!(queue = %queue, "rejected create with empty names");
            return Err(QueueError::InvalidInput { queue });
        }
        if self.registry.contains(&queue) {
            return Err(QueueError::AlreadyExists { queue });
        }
        let metadata = QueueMetadata::new(&queue, delay_seconds, visibility_timeout);
        let queue_log =
            match QueueLog::create(self.directory.clone(), metadata, self.segment_threshold).await
            {
                Ok(queue_log) => queue_log,
                Err(io_error) if io_error.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(queue = %queue, "queue files already exist on disk");
                    return Err(QueueError::AlreadyExists { queue });
                }
                Err(source) => {
                    warn!(queue = %queue, error = %source, "failed to create queue files");
                    return Err(QueueError::Io { queue, source });
                }
            };
        if self
            .registry
            .insert(Arc::new(LiveQueue::new(queue_log)))
            .is_err()
        {
            return Err(QueueError::AlreadyExists { queue });
        }
        info!(queue = %queue, "created queue");
        Ok(())
    }

    /// Appends a message at the tail of a queue.
    ///
    /// The message is durable in the log (though not synced) once this
    /// returns.
    pub async fn enqueue(&self, app_name: &str, name: &str, message: &str) -> Result<(), QueueError> {
        let queue = QueueIdentity::new(app_name, name);
        if !queue.is_valid() || message.trim().is_empty() {
            debug!(queue = %queue, "rejected enqueue with empty input");
            return Err(QueueError::InvalidInput { queue });
        }
        let live_queue = self.live_queue(&queue)?;
        live_queue
            .append(message)
            .await
            .map_err(|source| QueueError::AppendFailed { queue, source })
    }

    /// Removes and returns the message at the head of a queue.
    pub async fn dequeue(&self, app_name: &str, name: &str) -> Result<String, QueueError> {
        let queue = QueueIdentity::new(app_name, name);
        let live_queue = self.live_queue(&queue)?;
        live_queue
            .move_head()
            .await
            .map_err(|log_error| QueueError::from_log_error(queue, log_error))
    }

    /// Returns the message at the head of a queue without removing it.
    pub async fn peek(&self, app_name: &str, name: &str) -> Result<String, QueueError> {
        let queue = QueueIdentity::new(app_name, name);
        let live_queue = self.live_queue(&queue)?;
        live_queue
            .peek()
            .await
            .ok_or(QueueError::QueueEmpty { queue })
    }

    pub fn queue_exists(&self, app_name: &str, name: &str) -> bool {
        self.registry.contains(&QueueIdentity::new(app_name, name))
    }

    pub fn list_queues(&self) -> Vec<QueueIdentity> {
        self.registry.list_queues()
    }
}
