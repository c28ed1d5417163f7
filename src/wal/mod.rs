//! Per-queue write-ahead log.
//!
//! Each queue owns a checkpoint file and a sequence of append-only segment
//! files. LSNs are byte offsets within a segment and restart at 0 in every
//! new segment.

mod checkpoint;
mod directory;
mod queue_log;
mod reader;

pub use self::checkpoint::{Checkpoint, CheckpointFile};
pub use self::directory::LogDirectory;
pub use self::queue_log::{QueueLog, DEFAULT_SEGMENT_THRESHOLD};
pub use self::reader::{ReplayedRecord, SegmentLogReader};
