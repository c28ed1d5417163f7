use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::QueueIdentity;
use crate::position::SegmentNumber;
use crate::record::ReadRecordError;

/// Errors returned by the WAL engine of a single queue.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Io error: {0}")]
    Io(#[from] io::Error),
    #[error("Corrupt record")]
    CorruptRecord,
    #[error("Failed to persist checkpoint: {0}")]
    CheckpointPersist(#[source] io::Error),
    #[error("Queue is empty")]
    Empty,
}

impl From<ReadRecordError> for LogError {
    fn from(read_record_error: ReadRecordError) -> Self {
        match read_record_error {
            ReadRecordError::IoError(io_error) => LogError::Io(io_error),
            ReadRecordError::CorruptRecord => LogError::CorruptRecord,
        }
    }
}

/// Reasons for dropping a queue during recovery.
#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Io error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid checkpoint: {0}")]
    Checkpoint(#[from] serde_json::Error),
    #[error("Inconsistent checkpoint: {0}")]
    InconsistentCheckpoint(String),
    #[error("Failed to replay segment {segment}: {source}")]
    Replay {
        segment: SegmentNumber,
        #[source]
        source: ReadRecordError,
    },
}

/// Errors returned by the queue manager.
///
/// They all carry the identity of the queue the operation targeted.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("{queue}: Input was either empty or not valid")]
    InvalidInput { queue: QueueIdentity },
    #[error("{queue}: The application and queue combo already exists")]
    AlreadyExists { queue: QueueIdentity },
    #[error("{queue}: The application and queue combo does not exist")]
    QueueDoesNotExist { queue: QueueIdentity },
    #[error("{queue}: Empty")]
    QueueEmpty { queue: QueueIdentity },
    #[error("{queue}: Append failed: {source}")]
    AppendFailed {
        queue: QueueIdentity,
        #[source]
        source: LogError,
    },
    #[error("{queue}: Corrupt record")]
    CorruptRecord { queue: QueueIdentity },
    #[error("{queue}: Failed to persist checkpoint: {source}")]
    CheckpointPersistFailed {
        queue: QueueIdentity,
        #[source]
        source: io::Error,
    },
    #[error("{queue}: Io error: {source}")]
    Io {
        queue: QueueIdentity,
        #[source]
        source: io::Error,
    },
}

impl QueueError {
    /// Translates a WAL engine error for everything but appends.
    pub(crate) fn from_log_error(queue: QueueIdentity, log_error: LogError) -> QueueError {
        match log_error {
            LogError::Io(source) => QueueError::Io { queue, source },
            LogError::CorruptRecord => QueueError::CorruptRecord { queue },
            LogError::CheckpointPersist(source) => {
                QueueError::CheckpointPersistFailed { queue, source }
            }
            LogError::Empty => QueueError::QueueEmpty { queue },
        }
    }

    pub fn queue(&self) -> &QueueIdentity {
        match self {
            QueueError::InvalidInput { queue }
            | QueueError::AlreadyExists { queue }
            | QueueError::QueueDoesNotExist { queue }
            | QueueError::QueueEmpty { queue }
            | QueueError::AppendFailed { queue, .. }
            | QueueError::CorruptRecord { queue }
            | QueueError::CheckpointPersistFailed { queue, .. }
            | QueueError::Io { queue, .. } => queue,
        }
    }
}

/// Fatal errors preventing the broker from starting.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read the config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to parse the config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Returned when registering a queue whose identity is already taken.
#[derive(Error, Debug)]
#[error("Queue already registered: {0}")]
pub struct AlreadyRegistered(pub QueueIdentity);
