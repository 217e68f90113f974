//! In-process project-scoped event fan-out.
//!
//! Mutation handlers publish after the database write has committed;
//! delivery is fire-and-forget. Publishing to a channel nobody subscribed
//! to is not an error, and a lagging subscriber drops events rather than
//! blocking the publisher.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Buffered events per project channel before slow subscribers lose them.
const CHANNEL_CAPACITY: usize = 64;

/// Events emitted after relevant mutations.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    NewMessage {
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "senderId")]
        sender_id: String,
        #[serde(rename = "receiverId")]
        receiver_id: String,
    },
    ProgressUpdated {
        #[serde(rename = "projectId")]
        project_id: String,
        progress: i64,
    },
}

/// Per-project broadcast channels.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct ProjectEvents {
    channels: RwLock<HashMap<String, broadcast::Sender<Event>>>,
}

impl ProjectEvents {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to a project's channel, creating it on first use.
    pub async fn subscribe(&self, project_id: &str) -> broadcast::Receiver<Event> {
        let mut channels = self.channels.write().await;
        channels
            .entry(project_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to a project's channel.
    ///
    /// Channels without subscribers swallow the event silently; that is the
    /// contract, not a failure.
    pub async fn publish(&self, project_id: &str, event: Event) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(project_id) {
            let receivers = sender.send(event).unwrap_or(0);
            debug!("Published event to {} subscribers on {}", receivers, project_id);
        }
    }

    /// Number of live subscribers on a project channel.
    pub async fn subscriber_count(&self, project_id: &str) -> usize {
        let channels = self.channels.read().await;
        channels
            .get(project_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ProjectEvents {
    fn default() -> Self {
        Self::new()
    }
}
