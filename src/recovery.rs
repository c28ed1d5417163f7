//! Rebuilds the live queues from the checkpoint and segment files.
//!
//! Every queue is recovered in its own task. A queue that fails to recover
//! is logged and left out of the registry; it does not abort the others.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::RecoveryError;
use crate::live_queue::LiveQueue;
use crate::mem::MemQueue;
use crate::metadata::QueueIdentity;
use crate::registry::QueueRegistry;
use crate::wal::{Checkpoint, CheckpointFile, LogDirectory, QueueLog, SegmentLogReader};

/// Outcome of a recovery pass.
#[derive(Debug, Default)]
pub struct RecoveryReport {
    pub recovered: Vec<QueueIdentity>,
    pub skipped: Vec<PathBuf>,
}

/// Recovers every queue that has a checkpoint file in `directory` and
/// registers it.
///
/// Returns once all queues have been processed. Only a failure to list the
/// directory is returned as an error.
pub async fn recover_queues(
    directory: &LogDirectory,
    registry: &Arc<QueueRegistry>,
    segment_threshold: u64,
) -> io::Result<RecoveryReport> {
    info!(path = %directory.path().display(), "restoring queues from storage");
    let checkpoint_paths = directory.checkpoint_paths().await?;
    let mut report = RecoveryReport::default();
    if checkpoint_paths.is_empty() {
        info!("no control files found, nothing to recover");
        return Ok(report);
    }
    let mut recovery_tasks = JoinSet::new();
    for checkpoint_path in checkpoint_paths {
        let directory = directory.clone();
        let registry = registry.clone();
        recovery_tasks.spawn(async move {
            let recovery_result =
                recover_and_register(&directory, &registry, &checkpoint_path, segment_threshold)
                    .await;
            (checkpoint_path, recovery_result)
        });
    }
    while let Some(join_result) = recovery_tasks.join_next().await {
        match join_result {
            Ok((_, Ok(identity))) => report.recovered.push(identity),
            Ok((checkpoint_path, Err(recovery_error))) => {
                warn!(
                    path = %checkpoint_path.display(),
                    error = %recovery_error,
                    "failed to recover queue, skipping it"
                );
                report.skipped.push(checkpoint_path);
            }
            Err(join_error) => {
                warn!(error = %join_error, "queue recovery task failed");
            }
        }
    }
    report.recovered.sort();
    info!(
        num_recovered = report.recovered.len(),
        num_skipped = report.skipped.len(),
        "recovery complete"
    );
    Ok(report)
}

async fn recover_and_register(
    directory: &LogDirectory,
    registry: &QueueRegistry,
    checkpoint_path: &Path,
    segment_threshold: u64,
) -> Result<QueueIdentity, RecoveryError> {
    let queue_log = recover_queue(directory, checkpoint_path, segment_threshold).await?;
    let identity = queue_log.identity().clone();
    registry
        .insert(Arc::new(LiveQueue::new(queue_log)))
        .map_err(|already_registered| {
            RecoveryError::InconsistentCheckpoint(already_registered.to_string())
        })?;
    Ok(identity)
}

/// Replays the segments of a single queue, from its checkpoint head to the
/// end of its tail segment.
pub async fn recover_queue(
    directory: &LogDirectory,
    checkpoint_path: &Path,
    segment_threshold: u64,
) -> Result<QueueLog, RecoveryError> {
    let checkpoint_bytes = tokio::fs::read(checkpoint_path).await?;
    let mut checkpoint = Checkpoint::from_json(&checkpoint_bytes)?;
    checkpoint
        .validate()
        .map_err(RecoveryError::InconsistentCheckpoint)?;
    let identity = checkpoint.metadata.identity();
    let stem = identity.file_stem();

    let mut checkpoint_file = CheckpointFile::open(checkpoint_path).await?;
    let mut queue = MemQueue::new(checkpoint.metadata.clone());
    let mut segment_log_reader = SegmentLogReader::open(directory.clone(), &stem, &checkpoint);
    let mut last_tail_record_lsn: Option<u64> = None;
    loop {
        match segment_log_reader.read_record().await {
            Ok(Some(record)) => {
                if record.segment_number == checkpoint.tail_segment {
                    last_tail_record_lsn = Some(record.lsn);
                }
                queue.enqueue(record.message);
            }
            Ok(None) => break,
            Err(source) => {
                return Err(RecoveryError::Replay {
                    segment: segment_log_reader.current_segment(),
                    source,
                });
            }
        }
    }

    let tail_end = segment_log_reader.current_offset();
    if tail_end != checkpoint.next_lsn {
        // The checkpoint is written before the record. A crash in between
        // leaves it pointing past the data.
        warn!(
            queue = %identity,
            checkpoint_next_lsn = checkpoint.next_lsn,
            segment_end = tail_end,
            "checkpoint write cursor does not match the tail segment, reconciling"
        );
        let fallback_tail_lsn = if checkpoint.head_segment == checkpoint.tail_segment {
            checkpoint.head_lsn
        } else {
            0
        };
        checkpoint.next_lsn = tail_end;
        checkpoint.tail_lsn = last_tail_record_lsn.unwrap_or(fallback_tail_lsn);
        checkpoint_file.persist(&checkpoint).await?;
    }

    let segment_file = directory
        .open_segment_for_append(&stem, checkpoint.tail_segment)
        .await?;
    info!(
        queue = %identity,
        num_messages = queue.len(),
        head_segment = %checkpoint.head_segment,
        tail_segment = %checkpoint.tail_segment,
        "recovered queue"
    );
    Ok(QueueLog::from_recovered(
        directory.clone(),
        segment_threshold,
        segment_file,
        checkpoint_file,
        checkpoint,
        queue,
    ))
}
