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

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};

use crate::position::SegmentNumber;

const SEGMENT_SUFFIX: &str = ".wal";
const CHECKPOINT_SUFFIX: &str = ".control";

/// The directory holding the segment and checkpoint files of all queues.
///
/// For a queue with stem `{appname}{name}`, it contains:
/// - `{appname}{name}.control`, the JSON checkpoint,
/// - `{appname}{name}-{segment_number}.wal`, the segments.
#[derive(Clone, Debug)]
pub struct LogDirectory {
    dir: PathBuf,
}

fn segment_file_name(stem: &str, segment_number: SegmentNumber) -> String {
    format!("{}-{}{}", stem, segment_number, SEGMENT_SUFFIX)
}

fn checkpoint_file_name(stem: &str) -> String {
    format!("{}{}", stem, CHECKPOINT_SUFFIX)
}

fn is_checkpoint_file_name(file_name: &str) -> bool {
    file_name.len() > CHECKPOINT_SUFFIX.len() && file_name.ends_with(CHECKPOINT_SUFFIX)
}

impl LogDirectory {
    pub fn new(dir: &Path) -> LogDirectory {
        LogDirectory {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn segment_path(&self, stem: &str, segment_number: SegmentNumber) -> PathBuf {
        self.dir.join(segment_file_name(stem, segment_number))
    }

    pub fn checkpoint_path(&self, stem: &str) -> PathBuf {
        self.dir.join(checkpoint_file_name(stem))
    }

    /// Lists the checkpoint files of the directory, sorted by path.
    pub async fn checkpoint_paths(&self) -> io::Result<Vec<PathBuf>> {
        let mut read_dir = tokio::fs::read_dir(&self.dir).await?;
        let mut checkpoint_paths = Vec::new();
        while let Some(dir_entry) = read_dir.next_entry().await? {
            if !dir_entry.file_type().await?.is_file() {
                continue;
            }
            let is_checkpoint = dir_entry
                .file_name()
                .to_str()
                .map(is_checkpoint_file_name)
                .unwrap_or(false);
            if is_checkpoint {
                checkpoint_paths.push(dir_entry.path());
            }
        }
        checkpoint_paths.sort();
        Ok(checkpoint_paths)
    }

    /// Opens a segment for writing, creating it if needed.
    ///
    /// Writes always land at the end of the file.
    pub async fn open_segment_for_append(
        &self,
        stem: &str,
        segment_number: SegmentNumber,
    ) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.segment_path(stem, segment_number))
            .await
    }

    pub async fn open_segment_for_read(
        &self,
        stem: &str,
        segment_number: SegmentNumber,
    ) -> io::Result<File> {
        File::open(self.segment_path(stem, segment_number)).await
    }
}
