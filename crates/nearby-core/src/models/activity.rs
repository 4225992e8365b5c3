use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectionRequest, Conversation, Notification};

/// One entry of the merged activity feed.
///
/// Exactly one payload per kind; `timestamp()` always resolves, so ordering
/// never fails and no item is dropped for lacking an activity time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityItem {
    Request(ConnectionRequest),
    Message(Conversation),
    Notification(Notification),
}

impl ActivityItem {
    pub fn id(&self) -> &str {
        match self {
            ActivityItem::Request(r) => &r.id,
            ActivityItem::Message(c) => &c.id,
            ActivityItem::Notification(n) => &n.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ActivityItem::Request(r) => r.created_at,
            ActivityItem::Message(c) => c.activity_at(),
            ActivityItem::Notification(n) => n.created_at,
        }
    }
}
