//! In-memory backend double shared by the pipeline and engine tests.
//!
//! Holds plain row vectors behind mutexes and counts effective writes, so
//! idempotence properties can be asserted directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::backend::{Backend, BackendError, BackendResult, SchemaCapabilities};
use crate::models::{
    ConnectionRequest, Conversation, EventDomain, EventRow, InterestRow, InterestStatus,
    Notification, Profile, RelationshipRow, RequestStatus, RsvpRow, RsvpStatus,
};

pub fn pending_request(id: &str, sender_id: &str) -> ConnectionRequest {
    ConnectionRequest {
        id: id.to_string(),
        sender_id: sender_id.to_string(),
        sender: None,
        status: RequestStatus::Pending,
        created_at: Utc::now(),
    }
}

fn mock_error(what: &str) -> BackendError {
    BackendError::Status {
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        body: format!("mock failure: {what}"),
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub relationships: Mutex<Vec<RelationshipRow>>,
    pub profiles: Mutex<HashMap<String, Profile>>,
    pub conversations: Mutex<Vec<Conversation>>,
    pub notifications: Mutex<Vec<Notification>>,
    events: Mutex<Vec<(EventDomain, EventRow)>>,
    rsvps: Mutex<Vec<(EventDomain, RsvpRow)>>,
    interests: Mutex<Vec<(EventDomain, InterestRow)>>,

    /// Count of pending -> declined transitions actually applied.
    pub decline_transitions: AtomicUsize,
    /// Count of upsert_rsvp calls received.
    pub rsvp_upsert_calls: AtomicUsize,
    /// Count of pipeline fetch rounds (incremented per pending-request fetch).
    pub fetch_rounds: AtomicUsize,

    fetch_delay: Mutex<Option<std::time::Duration>>,
    fail_accepted: AtomicBool,
    fail_pending: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Seeding =====

    pub fn add_pending_request(&self, id: &str, sender_id: &str, receiver_id: &str) {
        self.relationships.lock().push(RelationshipRow {
            id: id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        });
    }

    pub fn add_pending_request_at(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        created_at: DateTime<Utc>,
    ) {
        self.relationships.lock().push(RelationshipRow {
            id: id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            status: RequestStatus::Pending,
            created_at,
        });
    }

    pub fn add_accepted(&self, id: &str, sender_id: &str, receiver_id: &str) {
        self.relationships.lock().push(RelationshipRow {
            id: id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            status: RequestStatus::Accepted,
            created_at: Utc::now(),
        });
    }

    pub fn add_conversation(&self, conversation: Conversation) {
        self.conversations.lock().push(conversation);
    }

    pub fn add_notification(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }

    pub fn add_event(
        &self,
        domain: EventDomain,
        id: &str,
        created_by: &str,
        starts_at: DateTime<Utc>,
    ) {
        self.events.lock().push((
            domain,
            EventRow {
                id: id.to_string(),
                created_by: created_by.to_string(),
                title: format!("event {id}"),
                starts_at,
                ends_at: None,
                duration_minutes: None,
                location: None,
                is_cancelled: false,
            },
        ));
    }

    pub fn cancel_event(&self, domain: EventDomain, id: &str) {
        for (d, event) in self.events.lock().iter_mut() {
            if *d == domain && event.id == id {
                event.is_cancelled = true;
            }
        }
    }

    pub fn add_rsvp(
        &self,
        domain: EventDomain,
        id: &str,
        event_id: &str,
        user_id: &str,
        status: RsvpStatus,
    ) {
        self.rsvps.lock().push((
            domain,
            RsvpRow {
                id: id.to_string(),
                event_id: event_id.to_string(),
                user_id: user_id.to_string(),
                status,
            },
        ));
    }

    pub fn add_interest(&self, domain: EventDomain, id: &str, event_id: &str, user_id: &str) {
        self.add_interest_with_status(domain, id, event_id, user_id, InterestStatus::Interested);
    }

    pub fn add_interest_with_status(
        &self,
        domain: EventDomain,
        id: &str,
        event_id: &str,
        user_id: &str,
        status: InterestStatus,
    ) {
        self.interests.lock().push((
            domain,
            InterestRow {
                id: id.to_string(),
                event_id: event_id.to_string(),
                user_id: user_id.to_string(),
                status,
            },
        ));
    }

    // ===== Failure / latency injection =====

    pub fn fail_accepted_lookup(&self) {
        self.fail_accepted.store(true, Ordering::SeqCst);
    }

    pub fn fail_pending_fetch(&self) {
        self.fail_pending.store(true, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: std::time::Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    // ===== Inspection =====

    pub fn request_status(&self, id: &str) -> Option<String> {
        self.relationships.lock().iter().find(|r| r.id == id).map(|r| {
            match r.status {
                RequestStatus::Pending => "pending",
                RequestStatus::Accepted => "accepted",
                RequestStatus::Declined => "declined",
            }
            .to_string()
        })
    }

    pub fn has_rsvp(&self, domain: EventDomain, event_id: &str, user_id: &str) -> bool {
        self.rsvps
            .lock()
            .iter()
            .any(|(d, r)| *d == domain && r.event_id == event_id && r.user_id == user_id)
    }

    /// Synchronous variant of the pending fetch, for seeding repair tests.
    pub fn fetch_pending(&self, viewer_id: &str) -> Vec<ConnectionRequest> {
        let profiles = self.profiles.lock();
        self.relationships
            .lock()
            .iter()
            .filter(|r| r.receiver_id == viewer_id && r.status == RequestStatus::Pending)
            .map(|r| ConnectionRequest {
                id: r.id.clone(),
                sender_id: r.sender_id.clone(),
                sender: profiles.get(&r.sender_id).cloned(),
                status: r.status,
                created_at: r.created_at,
            })
            .collect()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn probe_capabilities(&self) -> BackendResult<SchemaCapabilities> {
        Ok(SchemaCapabilities::default())
    }

    async fn fetch_pending_requests(
        &self,
        viewer_id: &str,
    ) -> BackendResult<Vec<ConnectionRequest>> {
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.fetch_rounds.fetch_add(1, Ordering::SeqCst);
        if self.fail_pending.load(Ordering::SeqCst) {
            return Err(mock_error("pending requests"));
        }
        Ok(self.fetch_pending(viewer_id))
    }

    async fn fetch_accepted_between(
        &self,
        viewer_id: &str,
        counterpart_ids: &[String],
    ) -> BackendResult<Vec<RelationshipRow>> {
        if self.fail_accepted.load(Ordering::SeqCst) {
            return Err(mock_error("accepted lookup"));
        }
        Ok(self
            .relationships
            .lock()
            .iter()
            .filter(|r| {
                r.status == RequestStatus::Accepted
                    && counterpart_ids.iter().any(|c| r.links(viewer_id, c))
            })
            .cloned()
            .collect())
    }

    async fn decline_request(&self, request_id: &str) -> BackendResult<()> {
        let mut rows = self.relationships.lock();
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == request_id && r.status == RequestStatus::Pending)
        {
            row.status = RequestStatus::Declined;
            self.decline_transitions.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn accept_request(&self, request_id: &str) -> BackendResult<()> {
        let mut rows = self.relationships.lock();
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == request_id && r.status == RequestStatus::Pending)
        {
            row.status = RequestStatus::Accepted;
        }
        Ok(())
    }

    async fn fetch_conversations(&self, _viewer_id: &str) -> BackendResult<Vec<Conversation>> {
        Ok(self.conversations.lock().clone())
    }

    async fn fetch_notifications(
        &self,
        _viewer_id: &str,
        _caps: SchemaCapabilities,
    ) -> BackendResult<Vec<Notification>> {
        Ok(self
            .notifications
            .lock()
            .iter()
            .filter(|n| !n.read)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, notification_id: &str) -> BackendResult<()> {
        for n in self.notifications.lock().iter_mut() {
            if n.id == notification_id {
                n.read = true;
            }
        }
        Ok(())
    }

    async fn mark_all_notifications_read(&self, _viewer_id: &str) -> BackendResult<()> {
        for n in self.notifications.lock().iter_mut() {
            n.read = true;
        }
        Ok(())
    }

    async fn fetch_rsvps(
        &self,
        domain: EventDomain,
        viewer_id: &str,
    ) -> BackendResult<Vec<RsvpRow>> {
        Ok(self
            .rsvps
            .lock()
            .iter()
            .filter(|(d, r)| *d == domain && r.user_id == viewer_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn fetch_interests(
        &self,
        domain: EventDomain,
        viewer_id: &str,
    ) -> BackendResult<Vec<InterestRow>> {
        Ok(self
            .interests
            .lock()
            .iter()
            .filter(|(d, i)| *d == domain && i.user_id == viewer_id)
            .map(|(_, i)| i.clone())
            .collect())
    }

    async fn fetch_events_created_by(
        &self,
        domain: EventDomain,
        viewer_id: &str,
        _caps: SchemaCapabilities,
    ) -> BackendResult<Vec<EventRow>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|(d, e)| *d == domain && e.created_by == viewer_id && !e.is_cancelled)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn fetch_events_by_ids(
        &self,
        domain: EventDomain,
        ids: &[String],
        _caps: SchemaCapabilities,
    ) -> BackendResult<Vec<EventRow>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|(d, e)| *d == domain && ids.contains(&e.id) && !e.is_cancelled)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn upsert_rsvp(
        &self,
        domain: EventDomain,
        event_id: &str,
        user_id: &str,
        status: RsvpStatus,
    ) -> BackendResult<()> {
        self.rsvp_upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rsvps.lock();
        if let Some((_, row)) = rows
            .iter_mut()
            .find(|(d, r)| *d == domain && r.event_id == event_id && r.user_id == user_id)
        {
            row.status = status;
        } else {
            rows.push((
                domain,
                RsvpRow {
                    id: uuid::Uuid::new_v4().to_string(),
                    event_id: event_id.to_string(),
                    user_id: user_id.to_string(),
                    status,
                },
            ));
        }
        Ok(())
    }
}
