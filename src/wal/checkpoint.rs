use std::io::{self, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::metadata::QueueMetadata;
use crate::position::SegmentNumber;

/// The pointers describing the durable state of a queue.
///
/// The field names are part of the on-disk format.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Offset of the oldest undelivered record, within `head_segment`.
    #[serde(rename = "headlsn")]
    pub head_lsn: u64,
    #[serde(rename = "headlsnfilenum")]
    pub head_segment: SegmentNumber,
    /// Offset of the most recently appended record, within `tail_segment`.
    #[serde(rename = "taillsn")]
    pub tail_lsn: u64,
    #[serde(rename = "taillsnfilenum")]
    pub tail_segment: SegmentNumber,
    /// Write cursor within the active segment, `tail_segment`.
    #[serde(rename = "nextlsn")]
    pub next_lsn: u64,
    #[serde(rename = "queuemetadata")]
    pub metadata: QueueMetadata,
}

impl Checkpoint {
    /// Checkpoint of a queue that was just created.
    pub fn new(metadata: QueueMetadata) -> Checkpoint {
        Checkpoint {
            head_lsn: 0,
            head_segment: SegmentNumber::FIRST,
            tail_lsn: 0,
            tail_segment: SegmentNumber::FIRST,
            next_lsn: 0,
            metadata,
        }
    }

    /// True iff head and tail point at the same record.
    pub fn head_is_tail(&self) -> bool {
        self.head_segment == self.tail_segment && self.head_lsn == self.tail_lsn
    }

    /// Checks the ordering invariants between head, tail and write cursor.
    pub fn validate(&self) -> Result<(), String> {
        if self.head_segment > self.tail_segment {
            return Err(format!(
                "head segment {} is after tail segment {}",
                self.head_segment, self.tail_segment
            ));
        }
        if self.head_segment == self.tail_segment && self.head_lsn > self.tail_lsn {
            return Err(format!(
                "head lsn {} is after tail lsn {}",
                self.head_lsn, self.tail_lsn
            ));
        }
        if self.next_lsn < self.tail_lsn {
            return Err(format!(
                "next lsn {} is before tail lsn {}",
                self.next_lsn, self.tail_lsn
            ));
        }
        Ok(())
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Checkpoint> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// The open checkpoint file of a queue.
///
/// Every persist rewrites the whole file.
pub struct CheckpointFile {
    file: File,
}

impl CheckpointFile {
    /// Creates the checkpoint file and writes the initial checkpoint.
    ///
    /// Fails with `io::ErrorKind::AlreadyExists` if the file exists.
    pub async fn create_new(path: &Path, checkpoint: &Checkpoint) -> io::Result<CheckpointFile> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        let mut checkpoint_file = CheckpointFile { file };
        checkpoint_file.persist(checkpoint).await?;
        Ok(checkpoint_file)
    }

    pub async fn open(path: &Path) -> io::Result<CheckpointFile> {
        let file = OpenOptions::new().read(true).write(true).open(path).await?;
        Ok(CheckpointFile { file })
    }

    /// Truncates the file and writes `checkpoint` in its place.
    ///
    /// The data is handed over to the OS, but not synced.
    pub async fn persist(&mut self, checkpoint: &Checkpoint) -> io::Result<()> {
        let json = checkpoint.to_json()?;
        self.file.set_len(0).await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        self.file.write_all(&json).await?;
        self.file.flush().await?;
        Ok(())
    }

    /// Forces the checkpoint to stable storage.
    pub async fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::QueueIdentity;

    fn checkpoint() -> Checkpoint {
        Checkpoint::new(QueueMetadata::new(&QueueIdentity::new("app", "q"), 10, 5))
    }

    #[test]
    fn test_checkpoint_json_format() {
        let mut checkpoint = checkpoint();
        checkpoint.tail_lsn = 37;
        checkpoint.next_lsn = 74;
        let json: serde_json::Value =
            serde_json::from_slice(&checkpoint.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "headlsn": 0,
                "headlsnfilenum": 1,
                "taillsn": 37,
                "taillsnfilenum": 1,
                "nextlsn": 74,
                "queuemetadata": {
                    "appname": "app",
                    "queueName": "q",
                    "delayseconds": 10,
                    "visibilitytimeout": 5,
                }
            })
        );
    }

    #[test]
    fn test_checkpoint_validate() {
        let mut checkpoint = checkpoint();
        assert!(checkpoint.validate().is_ok());
        assert!(checkpoint.head_is_tail());
        checkpoint.head_segment = SegmentNumber::from(2);
        assert!(checkpoint.validate().is_err());
        checkpoint.tail_segment = SegmentNumber::from(2);
        checkpoint.head_lsn = 10;
        assert!(checkpoint.validate().is_err());
        checkpoint.tail_lsn = 10;
        checkpoint.next_lsn = 50;
        assert!(checkpoint.validate().is_ok());
    }

    #[tokio::test]
    async fn test_checkpoint_file_rewrites_whole_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("appq.control");
        let mut checkpoint = checkpoint();
        checkpoint.next_lsn = 1_000_000;
        let mut checkpoint_file = CheckpointFile::create_new(&path, &checkpoint)
            .await
            .unwrap();
        checkpoint.next_lsn = 0;
        checkpoint_file.persist(&checkpoint).await.unwrap();
        checkpoint_file.sync().await.unwrap();
        let bytes = tokio::fs::read(&path).await.unwrap();
        assert_eq!(Checkpoint::from_json(&bytes).unwrap(), checkpoint);
    }

    #[tokio::test]
    async fn test_checkpoint_file_create_new_refuses_existing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("appq.control");
        CheckpointFile::create_new(&path, &checkpoint()).await.unwrap();
        let err = CheckpointFile::create_new(&path, &checkpoint())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }
}
