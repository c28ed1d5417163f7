use super::{LogRecord, ReadRecordError, RecordKind, RecordPrefix, RecordReader, RecordWriter};
use crate::position::SegmentNumber;
use crate::record::RECORD_PREFIX_LEN;

fn make_long_entry(len: usize) -> Vec<u8> {
    let mut long_entry = Vec::new();
    for i in 0u32..(1u32 + (len as u32) / 4u32) {
        long_entry.extend_from_slice(&i.to_le_bytes());
    }
    long_entry.resize(len, 0u8);
    long_entry
}

async fn assert_round_trip(payload: &[u8]) {
    let record = LogRecord::enqueue(1_234, SegmentNumber::from(3), payload);
    let mut buffer = Vec::new();
    let mut writer = RecordWriter::open(&mut buffer);
    writer.write_record(&record).await.unwrap();
    assert_eq!(buffer.len(), RECORD_PREFIX_LEN + payload.len());
    let mut reader = RecordReader::open(&buffer[..]);
    let (prefix, read_payload) = reader.read_record().await.unwrap().unwrap();
    assert_eq!(prefix.lsn, 1_234);
    assert_eq!(prefix.kind, RecordKind::Enqueue);
    assert_eq!(prefix.segment_number, SegmentNumber::from(3));
    assert_eq!(prefix.payload_size, payload.len() as u64);
    assert_eq!(read_payload, payload);
    assert!(matches!(reader.read_record().await, Ok(None)));
}

#[tokio::test]
async fn test_no_data() {
    let mut reader = RecordReader::open(&b""[..]);
    assert!(matches!(reader.read_record().await, Ok(None)));
}

#[tokio::test]
async fn test_empty_record() {
    assert_round_trip(b"").await;
}

#[tokio::test]
async fn test_single_byte_record() {
    assert_round_trip(b"x").await;
}

#[tokio::test]
async fn test_record_of_segment_threshold_size() {
    let long_entry = make_long_entry(crate::wal::DEFAULT_SEGMENT_THRESHOLD as usize);
    assert_round_trip(&long_entry).await;
}

#[test]
fn test_prefix_layout_is_little_endian() {
    let record = LogRecord::enqueue(1, SegmentNumber::from(2), b"abc");
    let mut buffer = Vec::new();
    record.serialize(&mut buffer);
    assert_eq!(&buffer[0..8], &1u64.to_le_bytes());
    assert_eq!(&buffer[8..16], &0u64.to_le_bytes());
    assert_eq!(&buffer[16..24], &2u64.to_le_bytes());
    assert_eq!(&buffer[24..32], &3u64.to_le_bytes());
    assert_eq!(&buffer[32..], b"abc");
}

#[test]
fn test_prefix_too_short_is_corrupt() {
    assert!(matches!(
        RecordPrefix::deserialize(&[0u8; RECORD_PREFIX_LEN - 1]),
        Err(ReadRecordError::CorruptRecord)
    ));
}

#[test]
fn test_unknown_kind_is_corrupt() {
    let mut buffer = Vec::new();
    LogRecord::enqueue(0, SegmentNumber::FIRST, b"").serialize(&mut buffer);
    buffer[8] = 7;
    assert!(matches!(
        RecordPrefix::deserialize(&buffer),
        Err(ReadRecordError::CorruptRecord)
    ));
}

#[tokio::test]
async fn test_several_records_track_offset() {
    let mut buffer = Vec::new();
    let mut writer = RecordWriter::open(&mut buffer);
    writer
        .write_record(&LogRecord::enqueue(0, SegmentNumber::FIRST, b"hello"))
        .await
        .unwrap();
    writer
        .write_record(&LogRecord::enqueue(37, SegmentNumber::FIRST, b"happy"))
        .await
        .unwrap();
    let mut reader = RecordReader::open(&buffer[..]);
    assert_eq!(reader.offset(), 0);
    let (prefix, payload) = reader.read_record().await.unwrap().unwrap();
    assert_eq!((prefix.lsn, payload), (0, &b"hello"[..]));
    assert_eq!(reader.offset(), 37);
    let (prefix, payload) = reader.read_record().await.unwrap().unwrap();
    assert_eq!((prefix.lsn, payload), (37, &b"happy"[..]));
    assert_eq!(reader.offset(), 74);
    assert!(matches!(reader.read_record().await, Ok(None)));
}

#[tokio::test]
async fn test_truncated_prefix_is_corrupt() {
    let mut buffer = Vec::new();
    LogRecord::enqueue(0, SegmentNumber::FIRST, b"hello").serialize(&mut buffer);
    buffer.truncate(RECORD_PREFIX_LEN - 2);
    let mut reader = RecordReader::open(&buffer[..]);
    assert!(matches!(
        reader.read_record().await,
        Err(ReadRecordError::CorruptRecord)
    ));
}

#[tokio::test]
async fn test_truncated_payload_is_corrupt() {
    let mut buffer = Vec::new();
    LogRecord::enqueue(0, SegmentNumber::FIRST, b"hello").serialize(&mut buffer);
    buffer.truncate(RECORD_PREFIX_LEN + 2);
    let mut reader = RecordReader::open(&buffer[..]);
    assert!(matches!(
        reader.read_record().await,
        Err(ReadRecordError::CorruptRecord)
    ));
}

#[tokio::test]
async fn test_read_prefix_does_not_consume_offset() {
    let mut buffer = Vec::new();
    LogRecord::enqueue(0, SegmentNumber::FIRST, b"hello").serialize(&mut buffer);
    let mut reader = RecordReader::open(&buffer[..]);
    let prefix = reader.read_prefix().await.unwrap().unwrap();
    assert_eq!(prefix.record_len(), Some((RECORD_PREFIX_LEN + 5) as u64));
    assert_eq!(reader.offset(), 0);
}

#[tokio::test]
async fn test_read_record_with_overflowing_payload_size() {
    let mut buffer = Vec::new();
    LogRecord::enqueue(0, SegmentNumber::FIRST, b"hello").serialize(&mut buffer);
    buffer[24..32].copy_from_slice(&u64::MAX.to_le_bytes());
    assert_eq!(RecordPrefix::deserialize(&buffer).unwrap().record_len(), None);
    let mut reader = RecordReader::open(&buffer[..]);
    assert!(matches!(
        reader.read_record().await,
        Err(ReadRecordError::CorruptRecord)
    ));
    assert_eq!(reader.offset(), 0);
}
