pub mod activity;
pub mod conversation;
pub mod event;
pub mod notification;
pub mod profile;
pub mod request;

pub use activity::ActivityItem;
pub use conversation::{Conversation, LastMessage};
pub use event::{
    EventDomain, EventRelation, EventRow, InterestRow, InterestStatus, RsvpRow, RsvpStatus,
    UpcomingEvent,
};
pub use notification::{Notification, NotificationKind};
pub use profile::Profile;
pub use request::{ConnectionRequest, RelationshipRow, RequestStatus};
