// Copyright (C) 2022 Quickwit, Inc.
//
// Quickwit is offered under the AGPL v3.0 and as commercial software.
// For commercial licensing, contact us at hello@quickwit.io.
//
// AGPL:
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use std::io::{self, SeekFrom};

use tokio::fs::File;
use tokio::io::AsyncSeekExt;
use tracing::{debug, warn};

use crate::error::LogError;
use crate::mem::MemQueue;
use crate::metadata::{QueueIdentity, QueueMetadata};
use crate::record::{LogRecord, RecordReader, RecordWriter};
use crate::wal::{Checkpoint, CheckpointFile, LogDirectory};

/// Once the write cursor of a segment reaches this offset, the next
/// append goes to a new segment.
///
/// The check happens before writing, so a segment can exceed it by up to
/// one record.
pub const DEFAULT_SEGMENT_THRESHOLD: u64 = 20_000;

/// The write-ahead log of a single queue, along with its in-memory mirror.
///
/// `QueueLog` is not synchronized: `LiveQueue` wraps it in a lock.
pub struct QueueLog {
    directory: LogDirectory,
    identity: QueueIdentity,
    stem: String,
    segment_threshold: u64,
    segment_writer: RecordWriter<File>,
    checkpoint_file: CheckpointFile,
    checkpoint: Checkpoint,
    queue: MemQueue,
}

impl QueueLog {
    /// Creates the checkpoint file and the first segment of a new queue.
    ///
    /// Fails with `io::ErrorKind::AlreadyExists` if the queue's checkpoint
    /// file exists already. If the first segment cannot be opened, the
    /// checkpoint file is removed so that the queue can be created again.
    pub async fn create(
        directory: LogDirectory,
        metadata: QueueMetadata,
        segment_threshold: u64,
    ) -> io::Result<QueueLog> {
        let checkpoint = Checkpoint::new(metadata.clone());
        let identity = metadata.identity();
        let stem = identity.file_stem();
        let checkpoint_path = directory.checkpoint_path(&stem);
        let checkpoint_file = CheckpointFile::create_new(&checkpoint_path, &checkpoint).await?;
        let segment_file = match directory
            .open_segment_for_append(&stem, checkpoint.tail_segment)
            .await
        {
            Ok(segment_file) => segment_file,
            Err(open_error) => {
                drop(checkpoint_file);
                if let Err(remove_error) = tokio::fs::remove_file(&checkpoint_path).await {
                    warn!(
                        queue = %identity,
                        error = %remove_error,
                        "failed to remove the checkpoint file of a queue that could not be created"
                    );
                }
                return Err(open_error);
            }
        };
        Ok(QueueLog {
            directory,
            identity,
            stem,
            segment_threshold,
            segment_writer: RecordWriter::open(segment_file),
            checkpoint_file,
            checkpoint,
            queue: MemQueue::new(metadata),
        })
    }

    /// Assembles a queue log from the state rebuilt by recovery.
    ///
    /// `segment_file` must be the tail segment, opened for append.
    pub(crate) fn from_recovered(
        directory: LogDirectory,
        segment_threshold: u64,
        segment_file: File,
        checkpoint_file: CheckpointFile,
        checkpoint: Checkpoint,
        queue: MemQueue,
    ) -> QueueLog {
        let identity = checkpoint.metadata.identity();
        let stem = identity.file_stem();
        QueueLog {
            directory,
            identity,
            stem,
            segment_threshold,
            segment_writer: RecordWriter::open(segment_file),
            checkpoint_file,
            checkpoint,
            queue,
        }
    }

    pub fn identity(&self) -> &QueueIdentity {
        &self.identity
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn peek(&self) -> Option<&str> {
        self.queue.peek()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> + '_ {
        self.queue.iter()
    }

    /// Appends a message to the log, then to the in-memory queue.
    ///
    /// The checkpoint is rewritten before the record is written to the
    /// segment. On error, the in-memory state is left untouched.
    pub async fn append(&mut self, message: &str) -> Result<(), LogError> {
        let mut next_checkpoint = self.checkpoint.clone();
        let mut new_segment_writer = None;
        if next_checkpoint.next_lsn >= self.segment_threshold {
            next_checkpoint.tail_segment = next_checkpoint.tail_segment.next();
            next_checkpoint.next_lsn = 0;
            let segment_file = self
                .directory
                .open_segment_for_append(&self.stem, next_checkpoint.tail_segment)
                .await?;
            debug!(queue = %self.identity, segment = %next_checkpoint.tail_segment, "rolled tail segment");
            new_segment_writer = Some(RecordWriter::open(segment_file));
        }
        let record = LogRecord::enqueue(
            next_checkpoint.next_lsn,
            next_checkpoint.tail_segment,
            message.as_bytes(),
        );
        next_checkpoint.tail_lsn = next_checkpoint.next_lsn;
        next_checkpoint.next_lsn += record.record_len();

        self.checkpoint_file
            .persist(&next_checkpoint)
            .await
            .map_err(LogError::CheckpointPersist)?;
        new_segment_writer
            .as_mut()
            .unwrap_or(&mut self.segment_writer)
            .write_record(&record)
            .await?;

        if let Some(segment_writer) = new_segment_writer {
            // Dropping the previous writer closes the previous segment.
            self.segment_writer = segment_writer;
        }
        self.checkpoint = next_checkpoint;
        self.queue.enqueue(message.to_string());
        Ok(())
    }

    /// Removes and returns the oldest message, advancing the checkpoint head
    /// past its record.
    ///
    /// When head and tail point at the same record, the message is popped
    /// but the checkpoint head stays on that record. A recovery from that
    /// checkpoint replays the consumed record once more.
    ///
    /// The head moves to the next segment as soon as it reaches the end of
    /// the head segment (`>=`), never resting on an end-of-file offset.
    ///
    /// A head record whose size overflows or runs past the end of its
    /// segment is reported as `CorruptRecord`, and nothing is changed.
    pub async fn move_head(&mut self) -> Result<String, LogError> {
        if self.queue.is_empty() {
            return Err(LogError::Empty);
        }
        if self.checkpoint.head_is_tail() {
            return self.queue.dequeue().ok_or(LogError::Empty);
        }
        let (next_head_lsn, head_segment_len) = self.read_head_record_end().await?;
        let mut next_checkpoint = self.checkpoint.clone();
        if next_checkpoint.head_segment != next_checkpoint.tail_segment
            && next_head_lsn >= head_segment_len
        {
            // Segments always start at offset 0.
            next_checkpoint.head_segment = next_checkpoint.head_segment.next();
            next_checkpoint.head_lsn = 0;
            debug!(queue = %self.identity, segment = %next_checkpoint.head_segment, "rolled head segment");
        } else {
            next_checkpoint.head_lsn = next_head_lsn;
        }
        self.checkpoint_file
            .persist(&next_checkpoint)
            .await
            .map_err(LogError::CheckpointPersist)?;
        self.checkpoint = next_checkpoint;
        self.queue.dequeue().ok_or(LogError::Empty)
    }

    /// Returns the offset following the record at the head, and the length
    /// of the head segment.
    async fn read_head_record_end(&self) -> Result<(u64, u64), LogError> {
        let head_lsn = self.checkpoint.head_lsn;
        let mut segment_file = self
            .directory
            .open_segment_for_read(&self.stem, self.checkpoint.head_segment)
            .await?;
        let segment_len = segment_file.metadata().await?.len();
        segment_file.seek(SeekFrom::Start(head_lsn)).await?;
        let mut record_reader = RecordReader::open_at(segment_file, head_lsn);
        let prefix = record_reader
            .read_prefix()
            .await?
            .ok_or(LogError::CorruptRecord)?;
        let record_end = prefix
            .record_len()
            .and_then(|record_len| head_lsn.checked_add(record_len))
            .filter(|&record_end| record_end <= segment_len)
            .ok_or(LogError::CorruptRecord)?;
        Ok((record_end, segment_len))
    }

    /// Forces the active segment to stable storage.
    pub async fn flush_segment(&mut self) -> io::Result<()> {
        self.segment_writer.sync().await
    }

    /// Forces the checkpoint file to stable storage.
    pub async fn flush_checkpoint(&mut self) -> io::Result<()> {
        self.checkpoint_file.sync().await
    }
}
