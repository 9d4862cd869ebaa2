//! Queue change events, derived by diffing the queue before and after a mutation.
//!
//! Events are never persisted. The orchestrator derives them while it holds the
//! queue lock and hands them to the [`EventBus`] once the lock is released.

pub mod bus;

use chrono::{DateTime, Utc};

use crate::core::state::{ParticipantId, QueueState};

pub use bus::{EventBus, Listener};

/// Position 0 changed identity. `None` means nobody.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderChanged {
    pub current: Option<ParticipantId>,
    pub previous: Option<ParticipantId>,
    pub actor: ParticipantId,
    pub at: DateTime<Utc>,
    /// The previous holder never acknowledged and the watchdog moved the turn on.
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondInLineChanged {
    pub current: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRemoved {
    pub actor: ParticipantId,
    pub removed: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    HolderChanged(HolderChanged),
    SecondInLineChanged(SecondInLineChanged),
    ParticipantRemoved(ParticipantRemoved),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    HolderChanged,
    SecondInLineChanged,
    ParticipantRemoved,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::HolderChanged,
        EventKind::SecondInLineChanged,
        EventKind::ParticipantRemoved,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::HolderChanged => write!(f, "holder_changed"),
            EventKind::SecondInLineChanged => write!(f, "second_in_line_changed"),
            EventKind::ParticipantRemoved => write!(f, "participant_removed"),
        }
    }
}

impl QueueEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            QueueEvent::HolderChanged(_) => EventKind::HolderChanged,
            QueueEvent::SecondInLineChanged(_) => EventKind::SecondInLineChanged,
            QueueEvent::ParticipantRemoved(_) => EventKind::ParticipantRemoved,
        }
    }
}

/// Derive the events implied by going from `before` to `after`.
///
/// `bulk_removed` lists the ids dropped by a bulk clear, in their prior order;
/// their removal events come first.
pub fn derive(
    before: &QueueState,
    after: &QueueState,
    actor: &str,
    at: DateTime<Utc>,
    bulk_removed: &[ParticipantId],
) -> Vec<QueueEvent> {
    let mut events: Vec<QueueEvent> = bulk_removed
        .iter()
        .map(|removed| {
            QueueEvent::ParticipantRemoved(ParticipantRemoved {
                actor: actor.to_string(),
                removed: removed.clone(),
            })
        })
        .collect();

    if before.holder() != after.holder() {
        events.push(QueueEvent::HolderChanged(HolderChanged {
            current: after.holder().map(str::to_string),
            previous: before.holder().map(str::to_string),
            actor: actor.to_string(),
            at,
            timed_out: false,
        }));
    }

    if let Some(second) = after.second() {
        if before.second() != Some(second) {
            events.push(QueueEvent::SecondInLineChanged(SecondInLineChanged {
                current: second.to_string(),
            }));
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap()
    }

    fn state(ids: &[&str]) -> QueueState {
        QueueState {
            entries: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn holder_changed(current: Option<&str>, previous: Option<&str>, actor: &str) -> QueueEvent {
        QueueEvent::HolderChanged(HolderChanged {
            current: current.map(str::to_string),
            previous: previous.map(str::to_string),
            actor: actor.to_string(),
            at: at(),
            timed_out: false,
        })
    }

    fn second(id: &str) -> QueueEvent {
        QueueEvent::SecondInLineChanged(SecondInLineChanged {
            current: id.to_string(),
        })
    }

    #[test]
    fn test_first_add_changes_holder_only() {
        let events = derive(&state(&[]), &state(&["a"]), "a", at(), &[]);
        assert_eq!(events, vec![holder_changed(Some("a"), None, "a")]);
    }

    #[test]
    fn test_second_add_changes_second_only() {
        let events = derive(&state(&["a"]), &state(&["a", "b"]), "b", at(), &[]);
        assert_eq!(events, vec![second("b")]);
    }

    #[test]
    fn test_third_add_is_silent() {
        let events = derive(&state(&["a", "b"]), &state(&["a", "b", "c"]), "c", at(), &[]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_head_removal_shifts_both_positions() {
        let events = derive(&state(&["a", "b", "c"]), &state(&["b", "c"]), "a", at(), &[]);
        assert_eq!(
            events,
            vec![holder_changed(Some("b"), Some("a"), "a"), second("c")]
        );
    }

    #[test]
    fn test_second_vanishing_emits_nothing_for_position_one() {
        let events = derive(&state(&["a", "b"]), &state(&["a"]), "b", at(), &[]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_pass_swaps_holder_and_second() {
        let events = derive(&state(&["a", "b"]), &state(&["b", "a"]), "a", at(), &[]);
        assert_eq!(
            events,
            vec![holder_changed(Some("b"), Some("a"), "a"), second("a")]
        );
    }

    #[test]
    fn test_bulk_clear() {
        let before = state(&["a", "b", "c"]);
        let events = derive(&before, &state(&[]), "z", at(), &before.entries);

        let removed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                QueueEvent::ParticipantRemoved(r) => Some(r.removed.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(removed, vec!["a", "b", "c"]);
        assert_eq!(events.last(), Some(&holder_changed(None, Some("a"), "z")));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(second("x").kind(), EventKind::SecondInLineChanged);
        assert_eq!(
            holder_changed(None, None, "x").kind(),
            EventKind::HolderChanged
        );
        assert_eq!(EventKind::ParticipantRemoved.to_string(), "participant_removed");
    }
}
