use std::io;

use tokio::sync::Mutex;

use crate::error::LogError;
use crate::metadata::QueueIdentity;
use crate::wal::{Checkpoint, QueueLog};

/// A registered queue.
///
/// All operations go through an exclusive lock, so that at most one append
/// or move head runs at a time for a given queue. Distinct queues do not
/// contend.
pub struct LiveQueue {
    identity: QueueIdentity,
    log: Mutex<QueueLog>,
}

impl LiveQueue {
    pub fn new(queue_log: QueueLog) -> LiveQueue {
        LiveQueue {
            identity: queue_log.identity().clone(),
            log: Mutex::new(queue_log),
        }
    }

    pub fn identity(&self) -> &QueueIdentity {
        &self.identity
    }

    pub async fn append(&self, message: &str) -> Result<(), LogError> {
        self.log.lock().await.append(message).await
    }

    /// Returns `LogError::Empty` if there is nothing to dequeue.
    pub async fn move_head(&self) -> Result<String, LogError> {
        self.log.lock().await.move_head().await
    }

    pub async fn peek(&self) -> Option<String> {
        self.log.lock().await.peek().map(str::to_string)
    }

    pub async fn len(&self) -> usize {
        self.log.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.lock().await.is_empty()
    }

    pub async fn checkpoint(&self) -> Checkpoint {
        self.log.lock().await.checkpoint().clone()
    }

    pub async fn messages(&self) -> Vec<String> {
        self.log
            .lock()
            .await
            .messages()
            .map(str::to_string)
            .collect()
    }

    pub async fn flush_segment(&self) -> io::Result<()> {
        self.log.lock().await.flush_segment().await
    }

    pub async fn flush_checkpoint(&self) -> io::Result<()> {
        self.log.lock().await.flush_checkpoint().await
    }
}
