use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of queues the registry is sized for. Not enforced.
pub const MAX_QUEUES: usize = 1_000;
/// Maximum message size in KB. Documented, but not enforced.
pub const MAX_MESSAGE_SIZE_KB: usize = 256;
/// Delay and visibility timeout values above this are reset to 0.
pub const MAX_DELAY_SECONDS: u32 = 30;

/// Identifies a queue: an application name and a queue name.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct QueueIdentity {
    pub app_name: String,
    pub name: String,
}

impl QueueIdentity {
    pub fn new(app_name: &str, name: &str) -> QueueIdentity {
        QueueIdentity {
            app_name: app_name.to_string(),
            name: name.to_string(),
        }
    }

    /// Both names must contain something other than whitespace.
    pub fn is_valid(&self) -> bool {
        !self.app_name.trim().is_empty() && !self.name.trim().is_empty()
    }

    /// Stem shared by all the files of this queue.
    ///
    /// This is the plain concatenation of both names, so distinct
    /// identities such as ("ab", "c") and ("a", "bc") share a stem.
    pub fn file_stem(&self) -> String {
        format!("{}{}", self.app_name, self.name)
    }
}

impl fmt::Display for QueueIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.app_name, self.name)
    }
}

fn default_fifo() -> bool {
    true
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueueMetadata {
    #[serde(rename = "appname")]
    pub app_name: String,
    #[serde(rename = "queueName")]
    pub name: String,
    #[serde(rename = "delayseconds")]
    pub delay_seconds: u32,
    /// Stored, never enforced.
    #[serde(rename = "visibilitytimeout")]
    pub visibility_timeout: u32,
    #[serde(skip, default = "default_fifo")]
    pub fifo: bool,
}

fn clamp_delay(value: u32) -> u32 {
    if value > MAX_DELAY_SECONDS {
        0
    } else {
        value
    }
}

impl QueueMetadata {
    /// Values above `MAX_DELAY_SECONDS` are reset to 0.
    pub fn new(identity: &QueueIdentity, delay_seconds: u32, visibility_timeout: u32) -> Self {
        QueueMetadata {
            app_name: identity.app_name.clone(),
            name: identity.name.clone(),
            delay_seconds: clamp_delay(delay_seconds),
            visibility_timeout: clamp_delay(visibility_timeout),
            fifo: true,
        }
    }

    pub fn identity(&self) -> QueueIdentity {
        QueueIdentity::new(&self.app_name, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validity() {
        assert!(QueueIdentity::new("app", "q").is_valid());
        assert!(!QueueIdentity::new("  ", "q").is_valid());
        assert!(!QueueIdentity::new("app", "\t").is_valid());
        assert!(!QueueIdentity::new("", "").is_valid());
    }

    #[test]
    fn test_identities_sharing_a_stem_are_distinct() {
        let left = QueueIdentity::new("ab", "c");
        let right = QueueIdentity::new("a", "bc");
        assert_eq!(left.file_stem(), right.file_stem());
        assert_ne!(left, right);
    }

    #[test]
    fn test_metadata_clamps_delays() {
        let identity = QueueIdentity::new("app", "q");
        let metadata = QueueMetadata::new(&identity, 30, 31);
        assert_eq!(metadata.delay_seconds, 30);
        assert_eq!(metadata.visibility_timeout, 0);
        assert!(metadata.fifo);
        assert_eq!(metadata.identity(), identity);
    }

    #[test]
    fn test_metadata_json_field_names() {
        let metadata = QueueMetadata::new(&QueueIdentity::new("app", "q"), 10, 5);
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "appname": "app",
                "queueName": "q",
                "delayseconds": 10,
                "visibilitytimeout": 5,
            })
        );
        let parsed: QueueMetadata = serde_json::from_value(json).unwrap();
        assert!(parsed.fifo);
    }
}
