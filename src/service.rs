use std::fmt;

use async_trait::async_trait;

use crate::error::QueueError;
use crate::queue_manager::QueueManager;

/// Operations exposed to remote clients.
///
/// A transport layer is expected to hold a `QueueService` and to translate
/// its errors with `Status::from`.
#[async_trait]
pub trait QueueService: Send + Sync {
    async fn create(
        &self,
        app_name: &str,
        name: &str,
        delay_seconds: u32,
        visibility_timeout: u32,
    ) -> Result<(), QueueError>;

    async fn enqueue(&self, app_name: &str, name: &str, message: &str) -> Result<(), QueueError>;

    async fn dequeue(&self, app_name: &str, name: &str) -> Result<String, QueueError>;

    async fn peek(&self, app_name: &str, name: &str) -> Result<String, QueueError>;
}

#[async_trait]
impl QueueService for QueueManager {
    async fn create(
        &self,
        app_name: &str,
        name: &str,
        delay_seconds: u32,
        visibility_timeout: u32,
    ) -> Result<(), QueueError> {
        QueueManager::create(self, app_name, name, delay_seconds, visibility_timeout).await
    }

    async fn enqueue(&self, app_name: &str, name: &str, message: &str) -> Result<(), QueueError> {
        QueueManager::enqueue(self, app_name, name, message).await
    }

    async fn dequeue(&self, app_name: &str, name: &str) -> Result<String, QueueError> {
        QueueManager::dequeue(self, app_name, name).await
    }

    async fn peek(&self, app_name: &str, name: &str) -> Result<String, QueueError> {
        QueueManager::peek(self, app_name, name).await
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusCode {
    AlreadyExists,
    NotFound,
    Internal,
    Unknown,
}

/// Error as reported to a remote client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl<'a> From<&'a QueueError> for Status {
    fn from(queue_error: &'a QueueError) -> Status {
        let code = match queue_error {
            QueueError::AlreadyExists { .. } => StatusCode::AlreadyExists,
            QueueError::QueueDoesNotExist { .. } | QueueError::QueueEmpty { .. } => {
                StatusCode::NotFound
            }
            QueueError::AppendFailed { .. } => StatusCode::Internal,
            _ => StatusCode::Unknown,
        };
        Status {
            code,
            message: queue_error.to_string(),
        }
    }
}

impl From<QueueError> for Status {
    fn from(queue_error: QueueError) -> Status {
        Status::from(&queue_error)
    }
}
