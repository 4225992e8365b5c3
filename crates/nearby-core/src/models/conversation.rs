use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Profile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessage {
    pub content: String,
    pub sender_id: String,
    pub created_at: DateTime<Utc>,
}

/// One row per accepted connection pair, served by the backend's
/// conversation-summary aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub partner_id: String,
    #[serde(default)]
    pub partner: Option<Profile>,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Timestamp used for feed ordering: the last message when one exists,
    /// otherwise the connection's creation time, so a fresh conversation
    /// with no messages is never dropped from the feed.
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map(|m| m.created_at)
            .unwrap_or(self.created_at)
    }

    pub fn partner_display(&self) -> Profile {
        self.partner
            .clone()
            .unwrap_or_else(|| Profile::placeholder(&self.partner_id))
    }
}
