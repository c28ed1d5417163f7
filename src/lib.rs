//! This library implements a durable FIFO message queue broker.
//!
//! Every queue is identified by an application name and a queue name, and
//! owns its own write-ahead log:
//! - a sequence of segment files `{app}{name}-{n}.wal`, holding one record
//!   per enqueued message,
//! - a JSON control file `{app}{name}.control`, holding the checkpoint (the
//!   position of the head and of the tail of the queue in the segments).
//!
//! Messages are also kept in memory. Peeking and dequeuing never read the
//! segments: dequeue only moves the checkpoint head forward.
//! On startup, the queues are rebuilt by replaying their segments from the
//! checkpoint head.
//!
//! Writes are handed over to the OS before an operation returns, and synced
//! to stable storage by a background task every 20 seconds.
//!
//! # Usage
//!
//! ```
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tempdir = tempfile::tempdir()?;
//! let config = queuelog::BrokerConfig {
//!     logs_path: tempdir.path().to_path_buf(),
//!     ..Default::default()
//! };
//! let broker = queuelog::Broker::open(&config).await?;
//! let queue_manager = broker.queue_manager();
//! queue_manager.create("app", "orders", 0, 0).await?;
//! queue_manager.enqueue("app", "orders", "hello").await?;
//! queue_manager.enqueue("app", "orders", "happy").await?;
//! assert_eq!(queue_manager.peek("app", "orders").await?, "hello");
//! assert_eq!(queue_manager.dequeue("app", "orders").await?, "hello");
//! assert_eq!(queue_manager.dequeue("app", "orders").await?, "happy");
//! assert!(queue_manager.dequeue("app", "orders").await.is_err());
//! broker.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod broker;
mod config;
mod error;
mod flush;
mod live_queue;
mod mem;
mod metadata;
mod position;
mod queue_manager;
mod record;
mod recovery;
mod registry;
mod service;
mod wal;


pub use self::broker::Broker;
pub use self::config::BrokerConfig;
pub use self::error::{ConfigError, LogError, QueueError, RecoveryError};
pub use self::flush::{flush_all, FlushScheduler, DEFAULT_FLUSH_INTERVAL};
pub use self::live_queue::LiveQueue;
pub use self::mem::MemQueue;
pub use self::metadata::{
    QueueIdentity, QueueMetadata, MAX_DELAY_SECONDS, MAX_MESSAGE_SIZE_KB, MAX_QUEUES,
};
pub use self::position::SegmentNumber;
pub use self::queue_manager::QueueManager;
pub use self::record::{
    LogRecord, ReadRecordError, RecordKind, RecordPrefix, RecordReader, RecordWriter,
    RECORD_PREFIX_LEN,
};
pub use self::recovery::{recover_queue, recover_queues, RecoveryReport};
pub use self::registry::QueueRegistry;
pub use self::service::{QueueService, Status, StatusCode};
pub use self::wal::{
    Checkpoint, CheckpointFile, LogDirectory, QueueLog, ReplayedRecord, SegmentLogReader,
    DEFAULT_SEGMENT_THRESHOLD,
};
