//! The persisted queue record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque participant identifier (a Telegram chat id in the bundled front end).
pub type ParticipantId = String;

/// Queue record, rewritten whole on every mutation.
///
/// Position 0 holds the turn. `hold_started_at` and `holder_sleeping` only
/// carry meaning while `entries` is non-empty.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueState {
    #[serde(default)]
    pub entries: Vec<ParticipantId>,

    #[serde(default)]
    pub hold_started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub holder_sleeping: bool,
}

impl QueueState {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Current holder, if any.
    pub fn holder(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    /// Participant at position 1, if any.
    pub fn second(&self) -> Option<&str> {
        self.entries.get(1).map(String::as_str)
    }

    pub fn position_of(&self, participant: &str) -> Option<usize> {
        self.entries.iter().position(|e| e == participant)
    }

    pub fn contains(&self, participant: &str) -> bool {
        self.position_of(participant).is_some()
    }

    pub fn is_holder(&self, participant: &str) -> bool {
        self.holder() == Some(participant)
    }

    /// Stamp a fresh holder assignment, or reset both fields when nobody holds the turn.
    pub fn mark_holder_assigned(&mut self, now: DateTime<Utc>) {
        if self.is_empty() {
            self.hold_started_at = None;
            self.holder_sleeping = false;
        } else {
            self.hold_started_at = Some(now);
            self.holder_sleeping = true;
        }
    }

    pub(crate) fn swap_first_two(&mut self) {
        self.entries.swap(0, 1);
    }
}
