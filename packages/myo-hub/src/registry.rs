use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for a connected viewer
pub type ViewerId = Uuid;

/// Serialized update shared by every viewer it is delivered to
pub type Payload = Arc<str>;

/// Default maximum number of simultaneous viewers
pub const DEFAULT_MAX_VIEWERS: usize = 64;

/// Registration result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationResult {
    /// Successfully registered
    Ok,
    /// Registry at capacity, registration rejected
    AtCapacity,
}

/// Delivery handle of a registered viewer
#[derive(Debug)]
pub struct ViewerEntry {
    pub outbox: mpsc::Sender<Payload>,
    pub connected_at: DateTime<Utc>,
}

/// Registry of connected viewers.
///
/// Owned by the hub coordinator; nothing else adds or removes entries.
#[derive(Debug)]
pub struct ViewerRegistry {
    viewers: HashMap<ViewerId, ViewerEntry>,
    max_viewers: usize,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_VIEWERS)
    }

    /// Create registry with custom max viewers
    pub fn with_capacity(max_viewers: usize) -> Self {
        Self {
            viewers: HashMap::new(),
            max_viewers,
        }
    }

    /// Register a viewer's outbound channel
    pub fn register(&mut self, id: ViewerId, outbox: mpsc::Sender<Payload>) -> RegistrationResult {
        if !self.viewers.contains_key(&id) && self.viewers.len() >= self.max_viewers {
            return RegistrationResult::AtCapacity;
        }

        self.viewers.insert(
            id,
            ViewerEntry {
                outbox,
                connected_at: Utc::now(),
            },
        );
        RegistrationResult::Ok
    }

    /// Remove a viewer, dropping its outbound channel
    pub fn remove(&mut self, id: &ViewerId) -> Option<ViewerEntry> {
        self.viewers.remove(id)
    }

    pub fn contains(&self, id: &ViewerId) -> bool {
        self.viewers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    pub fn max_viewers(&self) -> usize {
        self.max_viewers
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ViewerId, &ViewerEntry)> {
        self.viewers.iter()
    }
}

impl Default for ViewerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
