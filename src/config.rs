use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flush::DEFAULT_FLUSH_INTERVAL;
use crate::wal::DEFAULT_SEGMENT_THRESHOLD;

/// Broker settings, read from a JSON file.
///
/// Missing fields take their default value.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
    /// Directory holding the segment and control files.
    #[serde(rename = "logspath")]
    pub logs_path: PathBuf,
    /// Size in bytes past which appends move to a new segment.
    pub segment_threshold: u64,
    pub flush_interval_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            logs_path: PathBuf::from("logs"),
            segment_threshold: DEFAULT_SEGMENT_THRESHOLD,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL.as_secs(),
        }
    }
}

impl BrokerConfig {
    pub async fn load(path: &Path) -> Result<BrokerConfig, ConfigError> {
        let config_bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_slice(&config_bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}
