//! PostgREST-style client for the hosted backend.
//!
//! Every relation in the data model is exposed as a REST resource with
//! query-string filters; the conversation summary is a precomputed aggregate
//! behind an RPC endpoint. Writes are row-level PATCHes and upsert POSTs.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{Backend, BackendError, BackendResult, SchemaCapabilities};
use crate::config::CoreConfig;
use crate::models::{
    ConnectionRequest, Conversation, EventDomain, EventRow, InterestRow, Notification,
    RelationshipRow, RsvpRow, RsvpStatus,
};

/// Column list for event queries, branched on the probed schema version
/// instead of retrying on a "column missing" error at runtime.
fn event_select(caps: SchemaCapabilities) -> &'static str {
    if caps.event_ends_at_column {
        "id,created_by,title,starts_at,ends_at,location,is_cancelled"
    } else {
        "id,created_by,title,starts_at,duration_minutes,location,is_cancelled"
    }
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpBackend {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn table(domain: EventDomain, suffix: &str) -> String {
        format!("{}_event{}", domain.as_str(), suffix)
    }

    async fn check(response: reqwest::Response) -> BackendResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }
        Ok(response)
    }

    async fn get_rows<T: DeserializeOwned>(&self, path_and_query: &str) -> BackendResult<Vec<T>> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path_and_query))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn patch(&self, path_and_query: &str, body: serde_json::Value) -> BackendResult<()> {
        let response = self
            .client
            .patch(format!("{}/{}", self.base_url, path_and_query))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn upsert(&self, path_and_query: &str, body: serde_json::Value) -> BackendResult<()> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path_and_query))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// A zero-row select against an optional column. Success means the
    /// deployed schema has the column; a 4xx means it predates it.
    async fn probe_column(&self, table: &str, column: &str) -> BackendResult<bool> {
        let response = self
            .client
            .get(format!(
                "{}/{}?select={}&limit=0",
                self.base_url, table, column
            ))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn probe_capabilities(&self) -> BackendResult<SchemaCapabilities> {
        let notification_data_column = self.probe_column("notifications", "data").await?;
        let event_ends_at_column = self.probe_column("group_events", "ends_at").await?;
        tracing::info!(
            notification_data_column,
            event_ends_at_column,
            "probed backend schema capabilities"
        );
        Ok(SchemaCapabilities {
            notification_data_column,
            event_ends_at_column,
        })
    }

    async fn fetch_pending_requests(
        &self,
        viewer_id: &str,
    ) -> BackendResult<Vec<ConnectionRequest>> {
        self.get_rows(&format!(
            "relationships?receiver_id=eq.{viewer_id}&status=eq.pending\
             &select=id,sender_id,status,created_at,sender:profiles!sender_id(id,display_name,avatar_url)\
             &order=created_at.desc"
        ))
        .await
    }

    async fn fetch_accepted_between(
        &self,
        viewer_id: &str,
        counterpart_ids: &[String],
    ) -> BackendResult<Vec<RelationshipRow>> {
        if counterpart_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = counterpart_ids.join(",");
        // Either direction: viewer sent to a counterpart, or received from one.
        self.get_rows(&format!(
            "relationships?status=eq.accepted\
             &or=(and(sender_id=eq.{viewer_id},receiver_id=in.({ids})),\
                  and(receiver_id=eq.{viewer_id},sender_id=in.({ids})))"
        ))
        .await
    }

    async fn decline_request(&self, request_id: &str) -> BackendResult<()> {
        // The status predicate makes the write conditional: once the row is
        // no longer pending this matches nothing.
        self.patch(
            &format!("relationships?id=eq.{request_id}&status=eq.pending"),
            json!({ "status": "declined" }),
        )
        .await
    }

    async fn accept_request(&self, request_id: &str) -> BackendResult<()> {
        self.patch(
            &format!("relationships?id=eq.{request_id}&status=eq.pending"),
            json!({ "status": "accepted" }),
        )
        .await
    }

    async fn fetch_conversations(&self, viewer_id: &str) -> BackendResult<Vec<Conversation>> {
        self.get_rows(&format!(
            "rpc/conversation_summaries?viewer_id={viewer_id}"
        ))
        .await
    }

    async fn fetch_notifications(
        &self,
        viewer_id: &str,
        caps: SchemaCapabilities,
    ) -> BackendResult<Vec<Notification>> {
        let select = if caps.notification_data_column {
            "id,type,title,body,data,read,created_at"
        } else {
            "id,type,title,body,read,created_at"
        };
        self.get_rows(&format!(
            "notifications?user_id=eq.{viewer_id}&read=eq.false\
             &select={select}&order=created_at.desc"
        ))
        .await
    }

    async fn mark_notification_read(&self, notification_id: &str) -> BackendResult<()> {
        self.patch(
            &format!("notifications?id=eq.{notification_id}"),
            json!({ "read": true }),
        )
        .await
    }

    async fn mark_all_notifications_read(&self, viewer_id: &str) -> BackendResult<()> {
        self.patch(
            &format!("notifications?user_id=eq.{viewer_id}&read=eq.false"),
            json!({ "read": true }),
        )
        .await
    }

    async fn fetch_rsvps(
        &self,
        domain: EventDomain,
        viewer_id: &str,
    ) -> BackendResult<Vec<RsvpRow>> {
        self.get_rows(&format!(
            "{}?user_id=eq.{viewer_id}",
            Self::table(domain, "_rsvps")
        ))
        .await
    }

    async fn fetch_interests(
        &self,
        domain: EventDomain,
        viewer_id: &str,
    ) -> BackendResult<Vec<InterestRow>> {
        self.get_rows(&format!(
            "{}?user_id=eq.{viewer_id}",
            Self::table(domain, "_interests")
        ))
        .await
    }

    async fn fetch_events_created_by(
        &self,
        domain: EventDomain,
        viewer_id: &str,
        caps: SchemaCapabilities,
    ) -> BackendResult<Vec<EventRow>> {
        self.get_rows(&format!(
            "{}?created_by=eq.{viewer_id}&is_cancelled=eq.false&select={}",
            Self::table(domain, "s"),
            event_select(caps)
        ))
        .await
    }

    async fn fetch_events_by_ids(
        &self,
        domain: EventDomain,
        ids: &[String],
        caps: SchemaCapabilities,
    ) -> BackendResult<Vec<EventRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_rows(&format!(
            "{}?id=in.({})&is_cancelled=eq.false&select={}",
            Self::table(domain, "s"),
            ids.join(","),
            event_select(caps)
        ))
        .await
    }

    async fn upsert_rsvp(
        &self,
        domain: EventDomain,
        event_id: &str,
        user_id: &str,
        status: RsvpStatus,
    ) -> BackendResult<()> {
        self.upsert(
            &format!(
                "{}?on_conflict=event_id,user_id",
                Self::table(domain, "_rsvps")
            ),
            json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "event_id": event_id,
                "user_id": user_id,
                "status": status,
            }),
        )
        .await
    }
}
