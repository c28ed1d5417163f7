//! Binary encoding of the records stored in segment files.
//!
//! A record is a fixed 32 bytes prefix made of four little-endian `u64`
//! (lsn, kind, segment number, payload size) followed by the raw payload.
//! Records are variable-length, so readers first decode the prefix to learn
//! how many payload bytes follow.

mod reader;
mod writer;

use std::convert::TryFrom;

pub use self::reader::{ReadRecordError, RecordReader};
pub use self::writer::RecordWriter;
use crate::position::SegmentNumber;

pub const RECORD_PREFIX_LEN: usize = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordKind {
    Enqueue = 0,
    /// Never written at the moment.
    Dequeue = 1,
    /// Never written at the moment.
    Delete = 2,
}

impl TryFrom<u64> for RecordKind {
    type Error = ReadRecordError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RecordKind::Enqueue),
            1 => Ok(RecordKind::Dequeue),
            2 => Ok(RecordKind::Delete),
            _ => Err(ReadRecordError::CorruptRecord),
        }
    }
}

/// The fixed-size part of a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RecordPrefix {
    /// Byte offset of the record within its segment.
    pub lsn: u64,
    pub kind: RecordKind,
    pub segment_number: SegmentNumber,
    pub payload_size: u64,
}

impl RecordPrefix {
    /// Total size of the record, prefix included.
    ///
    /// Returns `None` if a corrupted payload size overflows.
    pub fn record_len(&self) -> Option<u64> {
        (RECORD_PREFIX_LEN as u64).checked_add(self.payload_size)
    }

    pub fn serialize(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.lsn.to_le_bytes());
        buffer.extend_from_slice(&(self.kind as u64).to_le_bytes());
        buffer.extend_from_slice(&u64::from(self.segment_number).to_le_bytes());
        buffer.extend_from_slice(&self.payload_size.to_le_bytes());
    }

    /// Decodes a prefix from the first 32 bytes of `buffer`.
    pub fn deserialize(buffer: &[u8]) -> Result<RecordPrefix, ReadRecordError> {
        if buffer.len() < RECORD_PREFIX_LEN {
            return Err(ReadRecordError::CorruptRecord);
        }
        let read_u64 = |start: usize| -> u64 {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&buffer[start..start + 8]);
            u64::from_le_bytes(bytes)
        };
        Ok(RecordPrefix {
            lsn: read_u64(0),
            kind: RecordKind::try_from(read_u64(8))?,
            segment_number: SegmentNumber::from(read_u64(16)),
            payload_size: read_u64(24),
        })
    }
}

/// A record as written to a segment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LogRecord<'a> {
    pub lsn: u64,
    pub kind: RecordKind,
    pub segment_number: SegmentNumber,
    pub payload: &'a [u8],
}

impl<'a> LogRecord<'a> {
    pub fn enqueue(lsn: u64, segment_number: SegmentNumber, payload: &'a [u8]) -> Self {
        LogRecord {
            lsn,
            kind: RecordKind::Enqueue,
            segment_number,
            payload,
        }
    }

    pub fn prefix(&self) -> RecordPrefix {
        RecordPrefix {
            lsn: self.lsn,
            kind: self.kind,
            segment_number: self.segment_number,
            payload_size: self.payload.len() as u64,
        }
    }

    pub fn record_len(&self) -> u64 {
        RECORD_PREFIX_LEN as u64 + self.payload.len() as u64
    }

    /// Clears the buffer first.
    pub fn serialize(&self, buffer: &mut Vec<u8>) {
        buffer.clear();
        self.prefix().serialize(buffer);
        buffer.extend_from_slice(self.payload);
    }
}

#[cfg(test)]
mod tests;
