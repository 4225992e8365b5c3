//! The four independent source fetchers.
//!
//! Each fetcher catches errors at its own boundary and substitutes an empty
//! result, so one source's outage can never blank the entire feed. All four
//! are issued concurrently; the event fetcher internally covers both event
//! domains (RSVP table + interest table + viewer-created events each).

use crate::backend::{Backend, SchemaCapabilities};
use crate::models::{
    ConnectionRequest, Conversation, EventDomain, EventRow, InterestRow, Notification, RsvpRow,
};

/// Raw attendance signals for one event domain, before classification.
#[derive(Debug, Default, Clone)]
pub struct DomainSignals {
    pub rsvps: Vec<RsvpRow>,
    pub interests: Vec<InterestRow>,
    pub created: Vec<EventRow>,
}

/// Everything one pipeline run reads, post error-swallowing.
#[derive(Debug, Default)]
pub struct SourceData {
    pub requests: Vec<ConnectionRequest>,
    pub conversations: Vec<Conversation>,
    pub notifications: Vec<Notification>,
    pub signals: Vec<(EventDomain, DomainSignals)>,
}

pub async fn fetch_all(
    backend: &dyn Backend,
    viewer_id: &str,
    caps: SchemaCapabilities,
) -> SourceData {
    let (requests, conversations, notifications, signals) = tokio::join!(
        fetch_pending_requests(backend, viewer_id),
        fetch_conversations(backend, viewer_id),
        fetch_notifications(backend, viewer_id, caps),
        fetch_event_signals(backend, viewer_id, caps),
    );

    SourceData {
        requests,
        conversations,
        notifications,
        signals,
    }
}

pub async fn fetch_pending_requests(
    backend: &dyn Backend,
    viewer_id: &str,
) -> Vec<ConnectionRequest> {
    match backend.fetch_pending_requests(viewer_id).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "pending-request fetch failed, using empty result");
            Vec::new()
        }
    }
}

pub async fn fetch_conversations(backend: &dyn Backend, viewer_id: &str) -> Vec<Conversation> {
    match backend.fetch_conversations(viewer_id).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "conversation fetch failed, using empty result");
            Vec::new()
        }
    }
}

pub async fn fetch_notifications(
    backend: &dyn Backend,
    viewer_id: &str,
    caps: SchemaCapabilities,
) -> Vec<Notification> {
    match backend.fetch_notifications(viewer_id, caps).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "notification fetch failed, using empty result");
            Vec::new()
        }
    }
}

/// Both event domains, three queries each. A failed sub-query degrades to an
/// empty slice for that signal only.
pub async fn fetch_event_signals(
    backend: &dyn Backend,
    viewer_id: &str,
    caps: SchemaCapabilities,
) -> Vec<(EventDomain, DomainSignals)> {
    let mut out = Vec::with_capacity(EventDomain::ALL.len());
    for domain in EventDomain::ALL {
        let (rsvps, interests, created) = tokio::join!(
            backend.fetch_rsvps(domain, viewer_id),
            backend.fetch_interests(domain, viewer_id),
            backend.fetch_events_created_by(domain, viewer_id, caps),
        );

        let rsvps = rsvps.unwrap_or_else(|e| {
            tracing::warn!(domain = domain.as_str(), error = %e, "rsvp fetch failed");
            Vec::new()
        });
        let interests = interests.unwrap_or_else(|e| {
            tracing::warn!(domain = domain.as_str(), error = %e, "interest fetch failed");
            Vec::new()
        });
        let created = created.unwrap_or_else(|e| {
            tracing::warn!(domain = domain.as_str(), error = %e, "created-events fetch failed");
            Vec::new()
        });

        out.push((
            domain,
            DomainSignals {
                rsvps,
                interests,
                created,
            },
        ));
    }
    out
}
