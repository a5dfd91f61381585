//! Event types for the Aurora event system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// Position in the emitter's sequence, 0 when published directly
    #[serde(default)]
    pub sequence: u64,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// All possible events in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Phase lifecycle events
    /// A phase change was asked for
    #[serde(rename = "phase.requested")]
    PhaseRequested {
        from: Option<u8>,
        to: u8,
        reason: String,
    },

    /// A phase change was asked for but no script is registered
    #[serde(rename = "phase.not_implemented")]
    PhaseNotImplemented { phase: u8 },

    /// The outgoing phase released every resource it owned
    #[serde(rename = "phase.torn_down")]
    PhaseTornDown { phase: u8 },

    /// The incoming phase script was handed to the runtime
    #[serde(rename = "phase.initializing")]
    PhaseInitializing { phase: u8 },

    /// The phase script started running its beats
    #[serde(rename = "phase.running")]
    PhaseRunning { phase: u8 },

    /// The phase script reached its completion beat
    #[serde(rename = "phase.completed")]
    PhaseCompleted { phase: u8 },

    /// The phase script failed with an unexpected error
    #[serde(rename = "phase.failed")]
    PhaseFailed { phase: u8, message: String },

    // Interaction events
    /// An interaction gate was presented to the player
    #[serde(rename = "gate.opened")]
    GateOpened { phase: u8, gate: u64, kind: String },

    /// An interaction gate resolved
    #[serde(rename = "gate.closed")]
    GateClosed {
        phase: u8,
        gate: u64,
        outcome: String,
    },

    // Progress events
    /// A card code unlocked a phase
    #[serde(rename = "code.accepted")]
    CodeAccepted { phase: u8 },

    /// A card code was refused
    #[serde(rename = "code.rejected")]
    CodeRejected { reason: String },

    /// Progress was replaced by an imported document
    #[serde(rename = "progress.imported")]
    ProgressImported,

    /// Progress was wiped
    #[serde(rename = "progress.reset")]
    ProgressReset,

    // System events
    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl Event {
    /// Get the phase associated with this event, if any
    pub fn phase(&self) -> Option<u8> {
        match self {
            Event::PhaseRequested { to, .. } => Some(*to),
            Event::PhaseNotImplemented { phase }
            | Event::PhaseTornDown { phase }
            | Event::PhaseInitializing { phase }
            | Event::PhaseRunning { phase }
            | Event::PhaseCompleted { phase }
            | Event::PhaseFailed { phase, .. }
            | Event::GateOpened { phase, .. }
            | Event::GateClosed { phase, .. }
            | Event::CodeAccepted { phase } => Some(*phase),
            Event::CodeRejected { .. }
            | Event::ProgressImported
            | Event::ProgressReset
            | Event::Error { .. } => None,
        }
    }

    /// Wire name of the event, as used in the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Event::PhaseRequested { .. } => "phase.requested",
            Event::PhaseNotImplemented { .. } => "phase.not_implemented",
            Event::PhaseTornDown { .. } => "phase.torn_down",
            Event::PhaseInitializing { .. } => "phase.initializing",
            Event::PhaseRunning { .. } => "phase.running",
            Event::PhaseCompleted { .. } => "phase.completed",
            Event::PhaseFailed { .. } => "phase.failed",
            Event::GateOpened { .. } => "gate.opened",
            Event::GateClosed { .. } => "gate.closed",
            Event::CodeAccepted { .. } => "code.accepted",
            Event::CodeRejected { .. } => "code.rejected",
            Event::ProgressImported => "progress.imported",
            Event::ProgressReset => "progress.reset",
            Event::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope_creation() {
        let envelope = EventEnvelope::new(Event::PhaseRunning { phase: 1 });

        assert!(!envelope.id.is_nil());
        assert_eq!(envelope.sequence, 0);
        assert!(envelope.timestamp <= Utc::now());
        assert_eq!(envelope.with_sequence(7).sequence, 7);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::PhaseRequested {
            from: Some(0),
            to: 1,
            reason: "code".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("phase.requested"));
        assert!(json.contains("\"from\":0"));
        assert!(json.contains("\"reason\":\"code\""));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"phase.torn_down","phase":3}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(event, Event::PhaseTornDown { phase: 3 });
    }

    #[test]
    fn test_kind_matches_tag() {
        let events = [
            Event::PhaseCompleted { phase: 2 },
            Event::GateOpened {
                phase: 2,
                gate: 1,
                kind: "choice".to_string(),
            },
            Event::ProgressReset,
            Event::CodeRejected {
                reason: "unknown".to_string(),
            },
        ];

        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.kind());
        }
    }

    #[test]
    fn test_event_phase() {
        assert_eq!(Event::PhaseInitializing { phase: 4 }.phase(), Some(4));
        assert_eq!(
            Event::PhaseRequested {
                from: None,
                to: 0,
                reason: "resume".to_string()
            }
            .phase(),
            Some(0)
        );
        assert_eq!(Event::ProgressImported.phase(), None);
    }
}
