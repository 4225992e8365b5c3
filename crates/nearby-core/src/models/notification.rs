use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-emitted notification kinds. Closed set plus a catch-all so a newer
/// server schema never breaks an older client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ConnectionRequest,
    ConnectionAccepted,
    NewMessage,
    ProfileVisit,
    EventInvite,
    EventReminder,
    EventUpdated,
    EventCancelled,
    EventComment,
    RsvpReceived,
    InterestReceived,
    GroupInvite,
    GroupJoinApproved,
    GroupPost,
    System,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Structured payload; shape varies per kind, so it stays opaque here.
    /// Absent on backends that predate the column.
    #[serde(default)]
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
