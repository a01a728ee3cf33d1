//! Outbound notifications about the organization log.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::organize::result::OrganizationResult;

/// A change to the organization log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "result", rename_all = "camelCase")]
pub enum OrganizationEvent {
    ItemAdded(OrganizationResult),
    ItemUpdated(OrganizationResult),
    ItemRemoved(OrganizationResult),
    LogReset,
}

impl OrganizationEvent {
    pub fn result(&self) -> Option<&OrganizationResult> {
        match self {
            Self::ItemAdded(r) | Self::ItemUpdated(r) | Self::ItemRemoved(r) => Some(r),
            Self::LogReset => None,
        }
    }
}

/// Broadcasts organization events to any number of subscribers.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Arc<broadcast::Sender<OrganizationEvent>>,
}

impl EventBroadcaster {
    /// Creates a broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: OrganizationEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrganizationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
