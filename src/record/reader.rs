use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::record::{RecordPrefix, RECORD_PREFIX_LEN};

pub struct RecordReader<R> {
    reader: R,
    record_buffer: Vec<u8>,
    // Offset of the next record to read, within the segment.
    offset: u64,
}

#[derive(Error, Debug)]
pub enum ReadRecordError {
    #[error("Io error: {0}")]
    IoError(#[from] io::Error),
    #[error("Corrupt record")]
    CorruptRecord,
}

impl<R: AsyncRead + Unpin> RecordReader<R> {
    pub fn open(reader: R) -> Self {
        Self::open_at(reader, 0)
    }

    /// Wraps a reader that has already been positioned at `offset`.
    pub fn open_at(reader: R, offset: u64) -> Self {
        RecordReader {
            reader,
            record_buffer: Vec::with_capacity(10_000),
            offset,
        }
    }

    /// Offset of the next record to be read.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the prefix of the next record.
    ///
    /// Returns `Ok(None)` on a clean end of file, and `CorruptRecord`
    /// if the stream ends in the middle of the prefix.
    /// The payload is not consumed.
    pub async fn read_prefix(&mut self) -> Result<Option<RecordPrefix>, ReadRecordError> {
        let mut prefix_bytes = [0u8; RECORD_PREFIX_LEN];
        let mut num_bytes_read = 0;
        while num_bytes_read < RECORD_PREFIX_LEN {
            let read_len = self.reader.read(&mut prefix_bytes[num_bytes_read..]).await?;
            if read_len == 0 {
                break;
            }
            num_bytes_read += read_len;
        }
        if num_bytes_read == 0 {
            return Ok(None);
        }
        RecordPrefix::deserialize(&prefix_bytes[..num_bytes_read]).map(Some)
    }

    /// Reads the next record, prefix and payload.
    ///
    /// The payload is returned from an internal buffer that is reused
    /// across calls.
    pub async fn read_record(&mut self) -> Result<Option<(RecordPrefix, &[u8])>, ReadRecordError> {
        let prefix = if let Some(prefix) = self.read_prefix().await? {
            prefix
        } else {
            return Ok(None);
        };
        let next_offset = prefix
            .record_len()
            .and_then(|record_len| self.offset.checked_add(record_len))
            .ok_or(ReadRecordError::CorruptRecord)?;
        // `take` keeps a corrupted size from triggering a huge allocation.
        self.record_buffer.clear();
        (&mut self.reader)
            .take(prefix.payload_size)
            .read_to_end(&mut self.record_buffer)
            .await?;
        if self.record_buffer.len() as u64 != prefix.payload_size {
            return Err(ReadRecordError::CorruptRecord);
        }
        self.offset = next_offset;
        Ok(Some((prefix, &self.record_buffer[..])))
    }
}
