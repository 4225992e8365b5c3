use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The two independent event ownership contexts. Each has its own event,
/// RSVP and interest relations on the backend and is queried separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDomain {
    Group,
    Personal,
}

impl EventDomain {
    pub const ALL: [EventDomain; 2] = [EventDomain::Group, EventDomain::Personal];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventDomain::Group => "group",
            EventDomain::Personal => "personal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Maybe,
    Cant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestStatus {
    Interested,
    NotInterested,
}

/// Viewer's relationship to an upcoming event. Ordering doubles as the
/// display rank: hosting sorts before rsvpd, rsvpd before interested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventRelation {
    Hosting,
    Rsvpd,
    Interested,
}

/// Raw event row. `ends_at` may be absent when the backend stores a
/// duration (or nothing) instead of an explicit end time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub created_by: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl EventRow {
    /// Effective end time: explicit `ends_at`, else `starts_at` plus the
    /// stored duration, else `starts_at` plus the configured default.
    pub fn effective_ends_at(&self, default_duration_minutes: i64) -> DateTime<Utc> {
        if let Some(ends_at) = self.ends_at {
            return ends_at;
        }
        let minutes = self.duration_minutes.unwrap_or(default_duration_minutes);
        self.starts_at + Duration::minutes(minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpRow {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub status: RsvpStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestRow {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub status: InterestStatus,
}

/// Derived per-run view of one upcoming event. Never stored; recomputed
/// from RSVP rows, interest rows and ownership on every pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub id: String,
    pub domain: EventDomain,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<String>,
    pub relation: EventRelation,
    pub rsvp_status: Option<RsvpStatus>,
}
