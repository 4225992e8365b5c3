//! Upcoming-events aggregation.
//!
//! Unions RSVP, interest and ownership signals per event domain into one
//! ranked list, and reports which hosted events are missing their implied
//! "going" RSVP row so the engine can backfill them. Classification rank:
//! hosting, then rsvpd, then interested; ties broken by start time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::sources::DomainSignals;
use crate::backend::{Backend, SchemaCapabilities};
use crate::models::{
    EventDomain, EventRelation, EventRow, InterestStatus, RsvpStatus, UpcomingEvent,
};

/// A hosted event whose "going" RSVP row should exist but doesn't.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillTarget {
    pub domain: EventDomain,
    pub event_id: String,
}

/// Builds the ranked upcoming list from the pre-fetched per-domain signals,
/// resolving full event records for every referenced id.
pub async fn build_upcoming(
    backend: &dyn Backend,
    viewer_id: &str,
    signals: &[(EventDomain, DomainSignals)],
    caps: SchemaCapabilities,
    now: DateTime<Utc>,
    default_duration_minutes: i64,
) -> (Vec<UpcomingEvent>, Vec<BackfillTarget>) {
    let mut upcoming = Vec::new();
    let mut backfills = Vec::new();

    for (domain, signals) in signals {
        let domain = *domain;

        let rsvp_by_event: HashMap<&str, RsvpStatus> = signals
            .rsvps
            .iter()
            .map(|r| (r.event_id.as_str(), r.status))
            .collect();
        let interested: HashSet<&str> = signals
            .interests
            .iter()
            .filter(|i| i.status == InterestStatus::Interested)
            .map(|i| i.event_id.as_str())
            .collect();

        // Union of every referenced event id; created events already carry
        // their full rows and need no second fetch.
        let created_ids: HashSet<&str> = signals.created.iter().map(|e| e.id.as_str()).collect();
        let referenced: Vec<String> = signals
            .rsvps
            .iter()
            .map(|r| r.event_id.clone())
            .chain(signals.interests.iter().map(|i| i.event_id.clone()))
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|id| !created_ids.contains(id.as_str()))
            .collect();

        let fetched = match backend.fetch_events_by_ids(domain, &referenced, caps).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(domain = domain.as_str(), error = %e, "event fetch failed");
                Vec::new()
            }
        };

        let mut events: HashMap<String, EventRow> = HashMap::new();
        for row in signals.created.iter().cloned().chain(fetched) {
            events.entry(row.id.clone()).or_insert(row);
        }

        for event in events.into_values() {
            if event.is_cancelled {
                continue;
            }
            let ends_at = event.effective_ends_at(default_duration_minutes);
            if ends_at <= now {
                continue;
            }

            let rsvp_status = rsvp_by_event.get(event.id.as_str()).copied();

            // Ownership implies attendance: a viewer-created event is
            // hosting even with no RSVP row and a stale "interested" row.
            let relation = if event.created_by == viewer_id {
                if rsvp_status.is_none() {
                    backfills.push(BackfillTarget {
                        domain,
                        event_id: event.id.clone(),
                    });
                }
                EventRelation::Hosting
            } else if rsvp_status.is_some() {
                EventRelation::Rsvpd
            } else if interested.contains(event.id.as_str()) {
                EventRelation::Interested
            } else {
                continue;
            };

            upcoming.push(UpcomingEvent {
                id: event.id,
                domain,
                title: event.title,
                starts_at: event.starts_at,
                ends_at,
                location: event.location,
                relation,
                rsvp_status,
            });
        }
    }

    upcoming.sort_by(|a, b| {
        a.relation
            .cmp(&b.relation)
            .then_with(|| a.starts_at.cmp(&b.starts_at))
    });

    (upcoming, backfills)
}

/// Materializes the missing "going" RSVP rows. Fire-and-forget from the
/// feed's perspective; the upsert is keyed on (event_id, user_id), so a
/// replay that races a concurrent run changes nothing.
pub async fn issue_backfills(
    backend: Arc<dyn Backend>,
    viewer_id: String,
    targets: Vec<BackfillTarget>,
) {
    futures::future::join_all(targets.into_iter().map(|target| {
        let backend = backend.clone();
        let viewer_id = viewer_id.clone();
        async move {
            if let Err(e) = backend
                .upsert_rsvp(target.domain, &target.event_id, &viewer_id, RsvpStatus::Going)
                .await
            {
                tracing::warn!(
                    event_id = %target.event_id,
                    error = %e,
                    "rsvp backfill failed"
                );
            }
        }
    }))
    .await;
}
