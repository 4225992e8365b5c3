//! Merges the three item kinds into one feed ordered by a single
//! timestamp axis, most recent first. The sort is stable, so items with
//! equal timestamps retain their fetch order, and every item has a
//! resolvable timestamp (see `ActivityItem::timestamp`), so nothing is
//! ever silently dropped.

use crate::models::{ActivityItem, ConnectionRequest, Conversation, Notification};

pub fn merge_timeline(
    requests: Vec<ConnectionRequest>,
    conversations: Vec<Conversation>,
    notifications: Vec<Notification>,
) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = conversations
        .into_iter()
        .map(ActivityItem::Message)
        .chain(notifications.into_iter().map(ActivityItem::Notification))
        .chain(requests.into_iter().map(ActivityItem::Request))
        .collect();

    items.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    items
}
