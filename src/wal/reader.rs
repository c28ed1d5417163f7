use std::collections::VecDeque;
use std::io::{self, SeekFrom};

use tokio::fs::File;
use tokio::io::AsyncSeekExt;

use crate::position::SegmentNumber;
use crate::record::{ReadRecordError, RecordReader};
use crate::wal::{Checkpoint, LogDirectory};

/// A message read back from a segment.
#[derive(Debug, Eq, PartialEq)]
pub struct ReplayedRecord {
    pub segment_number: SegmentNumber,
    /// Offset of the record within its segment.
    pub lsn: u64,
    pub message: String,
}

/// Reads the records of a queue, from the checkpoint head up to the end of
/// the tail segment.
pub struct SegmentLogReader {
    directory: LogDirectory,
    stem: String,
    head: (SegmentNumber, u64),
    segments: VecDeque<SegmentNumber>,
    reader_opt: Option<RecordReader<File>>,
    current_segment: SegmentNumber,
}

impl SegmentLogReader {
    pub fn open(directory: LogDirectory, stem: &str, checkpoint: &Checkpoint) -> Self {
        let segments = checkpoint
            .head_segment
            .up_to(checkpoint.tail_segment)
            .collect();
        SegmentLogReader {
            directory,
            stem: stem.to_string(),
            head: (checkpoint.head_segment, checkpoint.head_lsn),
            segments,
            reader_opt: None,
            current_segment: checkpoint.head_segment,
        }
    }

    /// Segment currently being read.
    pub fn current_segment(&self) -> SegmentNumber {
        self.current_segment
    }

    /// Offset following the last record read in the current segment.
    ///
    /// Once the reader is exhausted, this is the end of the valid data of
    /// the tail segment.
    pub fn current_offset(&self) -> u64 {
        if let Some(record_reader) = self.reader_opt.as_ref() {
            record_reader.offset()
        } else {
            self.head.1
        }
    }

    async fn load_next_segment(&mut self) -> io::Result<bool> {
        let next_segment = if let Some(next_segment) = self.segments.pop_front() {
            next_segment
        } else {
            return Ok(false);
        };
        // Only the head segment starts in the middle.
        let start_lsn = if next_segment == self.head.0 {
            self.head.1
        } else {
            0
        };
        self.current_segment = next_segment;
        let mut segment_file = self
            .directory
            .open_segment_for_read(&self.stem, next_segment)
            .await?;
        segment_file.seek(SeekFrom::Start(start_lsn)).await?;
        self.reader_opt = Some(RecordReader::open_at(segment_file, start_lsn));
        Ok(true)
    }

    pub async fn read_record(&mut self) -> Result<Option<ReplayedRecord>, ReadRecordError> {
        loop {
            if let Some(record_reader) = self.reader_opt.as_mut() {
                let lsn = record_reader.offset();
                if let Some((_prefix, payload)) = record_reader.read_record().await? {
                    let message = std::str::from_utf8(payload)
                        .map_err(|_| ReadRecordError::CorruptRecord)?
                        .to_string();
                    return Ok(Some(ReplayedRecord {
                        segment_number: self.current_segment,
                        lsn,
                        message,
                    }));
                }
            }
            if !self.load_next_segment().await? {
                return Ok(None);
            }
        }
    }
}
