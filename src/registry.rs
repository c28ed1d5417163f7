use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::AlreadyRegistered;
use crate::live_queue::LiveQueue;
use crate::metadata::{QueueIdentity, MAX_QUEUES};

/// Directory of the live queues of the process.
///
/// The lock only guards the map. It is never held while doing file I/O.
pub struct QueueRegistry {
    queues: RwLock<HashMap<QueueIdentity, Arc<LiveQueue>>>,
}

impl Default for QueueRegistry {
    fn default() -> Self {
        QueueRegistry {
            queues: RwLock::new(HashMap::with_capacity(MAX_QUEUES)),
        }
    }
}

impl QueueRegistry {
    pub fn get(&self, identity: &QueueIdentity) -> Option<Arc<LiveQueue>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    pub fn contains(&self, identity: &QueueIdentity) -> bool {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identity)
    }

    /// Registers a queue, unless its identity is already registered.
    ///
    /// The check and the insertion happen atomically.
    pub fn insert(&self, queue: Arc<LiveQueue>) -> Result<(), AlreadyRegistered> {
        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        match queues.entry(queue.identity().clone()) {
            Entry::Occupied(occupied) => Err(AlreadyRegistered(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(queue);
                Ok(())
            }
        }
    }

    /// Returns a point-in-time copy of the registered queues.
    ///
    /// Queues registered after the call are not part of the snapshot.
    pub fn snapshot(&self) -> Vec<Arc<LiveQueue>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Sorted identities of the registered queues.
    pub fn list_queues(&self) -> Vec<QueueIdentity> {
        let mut identities: Vec<QueueIdentity> = self
            .queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        identities.sort();
        identities
    }

    pub fn len(&self) -> usize {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
