pub mod http;

use async_trait::async_trait;

use crate::models::{
    ConnectionRequest, Conversation, EventDomain, EventRow, InterestRow, Notification,
    RelationshipRow, RsvpRow, RsvpStatus,
};

pub use http::HttpBackend;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Optional-schema flags, probed once at startup. Fetch queries branch on
/// these instead of retrying on runtime "column missing" errors.
#[derive(Debug, Clone, Copy)]
pub struct SchemaCapabilities {
    /// Notifications table carries the structured `data` column.
    pub notification_data_column: bool,
    /// Event tables store an explicit `ends_at` instead of a duration.
    pub event_ends_at_column: bool,
}

impl Default for SchemaCapabilities {
    fn default() -> Self {
        // Assume the current schema; the probe downgrades the flags when it
        // finds an older deployment.
        Self {
            notification_data_column: true,
            event_ends_at_column: true,
        }
    }
}

/// The hosted backend as seen by the reconciliation engine.
///
/// Everything the pipeline reads or repairs goes through this trait, so
/// tests run against an in-memory double and the engine never touches the
/// transport directly.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn probe_capabilities(&self) -> BackendResult<SchemaCapabilities>;

    // ===== Relationship / request stream =====

    /// Pending requests directed at `viewer_id`, sender profile joined in.
    async fn fetch_pending_requests(&self, viewer_id: &str)
        -> BackendResult<Vec<ConnectionRequest>>;

    /// Accepted relationship rows between `viewer_id` and any of
    /// `counterpart_ids`, in either direction.
    async fn fetch_accepted_between(
        &self,
        viewer_id: &str,
        counterpart_ids: &[String],
    ) -> BackendResult<Vec<RelationshipRow>>;

    /// Conditional corrective write: pending -> declined. A no-op once the
    /// row is no longer pending, which is what makes the repair idempotent.
    async fn decline_request(&self, request_id: &str) -> BackendResult<()>;

    async fn accept_request(&self, request_id: &str) -> BackendResult<()>;

    // ===== Conversations =====

    /// Conversation summaries for the viewer (precomputed aggregate:
    /// partner profile, last message, unread count).
    async fn fetch_conversations(&self, viewer_id: &str) -> BackendResult<Vec<Conversation>>;

    // ===== Notifications =====

    async fn fetch_notifications(
        &self,
        viewer_id: &str,
        caps: SchemaCapabilities,
    ) -> BackendResult<Vec<Notification>>;

    async fn mark_notification_read(&self, notification_id: &str) -> BackendResult<()>;

    async fn mark_all_notifications_read(&self, viewer_id: &str) -> BackendResult<()>;

    // ===== Events (per domain) =====

    async fn fetch_rsvps(&self, domain: EventDomain, viewer_id: &str)
        -> BackendResult<Vec<RsvpRow>>;

    async fn fetch_interests(
        &self,
        domain: EventDomain,
        viewer_id: &str,
    ) -> BackendResult<Vec<InterestRow>>;

    async fn fetch_events_created_by(
        &self,
        domain: EventDomain,
        viewer_id: &str,
        caps: SchemaCapabilities,
    ) -> BackendResult<Vec<EventRow>>;

    async fn fetch_events_by_ids(
        &self,
        domain: EventDomain,
        ids: &[String],
        caps: SchemaCapabilities,
    ) -> BackendResult<Vec<EventRow>>;

    /// Idempotent upsert keyed on (event_id, user_id). Used by the hosting
    /// backfill; replaying it leaves the row unchanged.
    async fn upsert_rsvp(
        &self,
        domain: EventDomain,
        event_id: &str,
        user_id: &str,
        status: RsvpStatus,
    ) -> BackendResult<()>;
}
