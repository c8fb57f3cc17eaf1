use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted after a workflow transition commits. Delivery is
/// fire-and-forget: a sink failure is logged and never rolls the
/// transition back.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    TeamApproved {
        team_id: Uuid,
        owner_id: Uuid,
    },
    TeamRejected {
        team_id: Uuid,
        owner_id: Uuid,
        reason: String,
    },
    JoinApproved {
        request_id: Uuid,
        team_id: Uuid,
        athlete_id: Uuid,
    },
    JoinRejected {
        request_id: Uuid,
        team_id: Uuid,
        athlete_id: Uuid,
        reason: String,
    },
    LeaveApproved {
        request_id: Uuid,
        team_id: Uuid,
        athlete_id: Uuid,
    },
    LeaveRejected {
        request_id: Uuid,
        team_id: Uuid,
        athlete_id: Uuid,
    },
    PlayerRemoved {
        team_id: Uuid,
        athlete_id: Uuid,
    },
    JerseyUpdated {
        team_id: Uuid,
        athlete_id: Uuid,
        jersey_number: Option<i16>,
    },
}

impl WorkflowEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowEvent::TeamApproved { .. } => "team_approved",
            WorkflowEvent::TeamRejected { .. } => "team_rejected",
            WorkflowEvent::JoinApproved { .. } => "join_approved",
            WorkflowEvent::JoinRejected { .. } => "join_rejected",
            WorkflowEvent::LeaveApproved { .. } => "leave_approved",
            WorkflowEvent::LeaveRejected { .. } => "leave_rejected",
            WorkflowEvent::PlayerRemoved { .. } => "player_removed",
            WorkflowEvent::JerseyUpdated { .. } => "jersey_updated",
        }
    }

    /// Who should be told, when anyone should.
    pub fn recipient(&self) -> Option<Uuid> {
        match self {
            WorkflowEvent::TeamApproved { owner_id, .. }
            | WorkflowEvent::TeamRejected { owner_id, .. } => Some(*owner_id),
            WorkflowEvent::JoinApproved { athlete_id, .. }
            | WorkflowEvent::JoinRejected { athlete_id, .. }
            | WorkflowEvent::LeaveApproved { athlete_id, .. }
            | WorkflowEvent::LeaveRejected { athlete_id, .. }
            | WorkflowEvent::PlayerRemoved { athlete_id, .. }
            | WorkflowEvent::JerseyUpdated { athlete_id, .. } => Some(*athlete_id),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn emit(&self, event: WorkflowEvent);
}

/// Structured-log sink; the default when nothing subscribes.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn emit(&self, event: WorkflowEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(
                kind = event.kind(),
                recipient = ?event.recipient(),
                %payload,
                "workflow event"
            ),
            Err(e) => tracing::warn!(kind = event.kind(), "failed to serialize event: {e}"),
        }
    }
}

/// Fan-out over a tokio broadcast channel, for a transport layer that pushes
/// events to connected clients.
pub struct BroadcastSink {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn emit(&self, event: WorkflowEvent) {
        // Send fails only when nobody is listening; that is not an error.
        if self.tx.send(event).is_err() {
            tracing::debug!("workflow event dropped: no subscribers");
        }
    }
}

/// Captures events for assertions in tests.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<WorkflowEvent> {
        std::mem::take(&mut self.events.lock().expect("sink lock poisoned"))
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, event: WorkflowEvent) {
        self.events.lock().expect("sink lock poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_know_their_recipient() {
        let owner = Uuid::new_v4();
        let event = WorkflowEvent::TeamApproved {
            team_id: Uuid::new_v4(),
            owner_id: owner,
        };
        assert_eq!(event.recipient(), Some(owner));
        assert_eq!(event.kind(), "team_approved");
    }

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = WorkflowEvent::JerseyUpdated {
            team_id: Uuid::new_v4(),
            athlete_id: Uuid::new_v4(),
            jersey_number: Some(23),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "jersey_updated");
        assert_eq!(json["jersey_number"], 23);
    }

    #[tokio::test]
    async fn broadcast_sink_fans_out() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();
        sink.emit(WorkflowEvent::PlayerRemoved {
            team_id: Uuid::new_v4(),
            athlete_id: Uuid::new_v4(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), "player_removed");
    }
}
