use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

/// A one-directional connection proposal.
///
/// Transitions pending -> accepted/declined by the receiver, or is
/// force-declined by the repair pass when an accepted connection already
/// exists between the pair. Never resurrected once declined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: String,
    pub sender_id: String,
    /// Resolved sender profile; `None` when resolution failed (the item is
    /// still emitted with a placeholder identity).
    #[serde(default)]
    pub sender: Option<Profile>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl ConnectionRequest {
    pub fn sender_display(&self) -> Profile {
        self.sender
            .clone()
            .unwrap_or_else(|| Profile::placeholder(&self.sender_id))
    }
}

/// Raw relationship row as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl RelationshipRow {
    /// True when this row connects `a` and `b` in either direction.
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}
