use crate::domain::project::ProjectStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A single status transition, as delivered to subscribers.
///
/// Delivery is at-least-once: the push path and the UI's fallback poll can
/// both surface the same transition, and consumers must tolerate that.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub project_id: Uuid,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

/// In-process fan-out of project status transitions.
///
/// Backed by a broadcast channel: slow subscribers lose the oldest events,
/// never the channel itself, and a dropped event is recovered by the poll
/// endpoint reading the row directly.
pub struct StatusChannel {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, project_id: Uuid, status: ProjectStatus, error: Option<String>) {
        let event = StatusEvent {
            project_id,
            status,
            error,
            at: Utc::now(),
        };

        tracing::debug!(
            project_id = %project_id,
            status = %status,
            "Publishing status transition"
        );

        // No subscribers is fine; the poll endpoint still observes the row.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new(64)
    }
}
