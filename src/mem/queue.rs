use std::collections::VecDeque;

use crate::metadata::QueueMetadata;

/// FIFO of the messages that have not been dequeued yet.
///
/// It mirrors the records between the head and the tail of the queue log.
/// It does not touch durable state: the WAL engine drives it.
pub struct MemQueue {
    metadata: QueueMetadata,
    messages: VecDeque<String>,
}

impl MemQueue {
    pub fn new(metadata: QueueMetadata) -> Self {
        MemQueue {
            metadata,
            messages: VecDeque::new(),
        }
    }

    pub fn metadata(&self) -> &QueueMetadata {
        &self.metadata
    }

    pub fn enqueue(&mut self, message: String) {
        self.messages.push_back(message);
    }

    /// Returns the oldest message without removing it.
    pub fn peek(&self) -> Option<&str> {
        self.messages.front().map(String::as_str)
    }

    /// Removes and returns the oldest message.
    pub fn dequeue(&mut self) -> Option<String> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.messages.iter().map(String::as_str)
    }
}
