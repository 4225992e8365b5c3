//! Pipeline orchestration and the externally-observed feed state.
//!
//! One logical pipeline run: fetch the four sources concurrently, repair the
//! request stream, aggregate upcoming events, merge the timeline, then swap
//! the published state and write through the snapshot cache. Corrective and
//! backfill writes are spawned, never awaited; the contract is eventually
//! consistent and self-healing (the next run repairs whatever a failed write
//! left behind).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::backend::{Backend, SchemaCapabilities};
use crate::config::CoreConfig;
use crate::models::{ActivityItem, UpcomingEvent};
use crate::pipeline::{repair, sources, timeline, upcoming};
use crate::store::SnapshotCache;
use crate::subscriber::RefreshRequested;

/// The merged, published feed. Replaced atomically at the end of each run;
/// callers never observe a partially-built state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedState {
    pub items: Vec<ActivityItem>,
    pub upcoming: Vec<UpcomingEvent>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl FeedState {
    /// Badge count: unread messages plus unread notifications.
    pub fn unread_total(&self) -> u32 {
        self.items
            .iter()
            .map(|item| match item {
                ActivityItem::Message(c) => c.unread_count,
                ActivityItem::Notification(n) => u32::from(!n.read),
                ActivityItem::Request(_) => 0,
            })
            .sum()
    }
}

enum FlightRole {
    Leader(watch::Sender<bool>),
    Follower(watch::Receiver<bool>),
}

pub struct FeedEngine {
    backend: Arc<dyn Backend>,
    cache: SnapshotCache,
    viewer_id: String,
    caps: SchemaCapabilities,
    default_event_duration_minutes: i64,
    state: RwLock<FeedState>,
    refreshing: AtomicBool,
    /// Present while a run is in flight; followers await the receiver,
    /// which carries the leader run's success flag.
    in_flight: Mutex<Option<watch::Receiver<bool>>>,
}

impl FeedEngine {
    /// Probes backend capabilities once, then paints the previous feed from
    /// the snapshot cache so the caller has something to show before the
    /// first network round trip.
    pub async fn start(config: CoreConfig, backend: Arc<dyn Backend>) -> Arc<Self> {
        let caps = match backend.probe_capabilities().await {
            Ok(caps) => caps,
            Err(e) => {
                tracing::warn!(error = %e, "capability probe failed, assuming current schema");
                SchemaCapabilities::default()
            }
        };

        let engine = Arc::new(Self {
            backend,
            cache: SnapshotCache::new(&config.data_dir),
            viewer_id: config.viewer_id,
            caps,
            default_event_duration_minutes: config.default_event_duration_minutes,
            state: RwLock::new(FeedState::default()),
            refreshing: AtomicBool::new(false),
            in_flight: Mutex::new(None),
        });
        engine.load_cached_feed();
        engine
    }

    fn cache_key(&self) -> String {
        format!("feed_{}", self.viewer_id)
    }

    fn load_cached_feed(&self) {
        let key = self.cache_key();
        let Some(value) = self.cache.get(&key).or_else(|| self.cache.load_durable(&key)) else {
            return;
        };
        match serde_json::from_value::<FeedState>(value) {
            Ok(cached) => {
                tracing::debug!(items = cached.items.len(), "painted feed from snapshot");
                *self.state.write() = cached;
            }
            Err(e) => tracing::warn!(error = %e, "cached snapshot unreadable, ignoring"),
        }
    }

    // ===== Read access =====

    pub fn feed(&self) -> FeedState {
        self.state.read().clone()
    }

    pub fn items(&self) -> Vec<ActivityItem> {
        self.state.read().items.clone()
    }

    pub fn upcoming_events(&self) -> Vec<UpcomingEvent> {
        self.state.read().upcoming.clone()
    }

    /// True only during a non-silent run; silent runs keep the previous
    /// feed presented as-is.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    // ===== Pipeline =====

    /// Runs the full pipeline. Concurrent callers coalesce onto the run
    /// already in flight and share its outcome, so a manual refresh racing
    /// a push-triggered one costs a single fetch round.
    pub async fn refresh(&self, silent: bool) -> Result<()> {
        let role = {
            let mut guard = self.in_flight.lock();
            if let Some(rx) = guard.as_ref() {
                FlightRole::Follower(rx.clone())
            } else {
                let (tx, rx) = watch::channel(true);
                *guard = Some(rx);
                FlightRole::Leader(tx)
            }
        };

        match role {
            FlightRole::Follower(mut rx) => {
                // The leader publishes its success flag before dropping the
                // sender; the last value stays readable after the drop.
                let _ = rx.changed().await;
                if *rx.borrow() {
                    Ok(())
                } else {
                    Err(anyhow!("refresh failed in coalesced run"))
                }
            }
            FlightRole::Leader(tx) => {
                if !silent {
                    self.refreshing.store(true, Ordering::SeqCst);
                }
                let result = self.run_pipeline().await;
                self.refreshing.store(false, Ordering::SeqCst);
                // Clear the slot first so a caller arriving now leads a
                // fresh run instead of adopting this one's outcome.
                self.in_flight.lock().take();
                let _ = tx.send(result.is_ok());
                // Dropping the sender releases any follower that has not
                // yet observed the flag.
                drop(tx);
                result
            }
        }
    }

    async fn run_pipeline(&self) -> Result<()> {
        let data = sources::fetch_all(self.backend.as_ref(), &self.viewer_id, self.caps).await;

        let (requests, stale_ids) =
            repair::repair_pending_requests(self.backend.as_ref(), &self.viewer_id, data.requests)
                .await;
        if !stale_ids.is_empty() {
            tokio::spawn(repair::issue_declines(self.backend.clone(), stale_ids));
        }

        let (upcoming, backfills) = upcoming::build_upcoming(
            self.backend.as_ref(),
            &self.viewer_id,
            &data.signals,
            self.caps,
            Utc::now(),
            self.default_event_duration_minutes,
        )
        .await;
        if !backfills.is_empty() {
            tokio::spawn(upcoming::issue_backfills(
                self.backend.clone(),
                self.viewer_id.clone(),
                backfills,
            ));
        }

        let items = timeline::merge_timeline(requests, data.conversations, data.notifications);

        let next = FeedState {
            items,
            upcoming,
            refreshed_at: Some(Utc::now()),
        };
        *self.state.write() = next.clone();

        match serde_json::to_value(&next) {
            Ok(value) => self.cache.set(&self.cache_key(), value),
            Err(e) => tracing::warn!(error = %e, "feed snapshot serialization failed"),
        }
        Ok(())
    }

    /// Consumes typed refresh requests from the change subscriber. The
    /// engine, not the transport, owns when the pipeline runs.
    pub async fn serve_refresh_requests(
        self: Arc<Self>,
        mut refresh_rx: mpsc::Receiver<RefreshRequested>,
    ) {
        while let Some(request) = refresh_rx.recv().await {
            if let Err(e) = self.refresh(request.silent).await {
                tracing::warn!(error = %e, "push-triggered refresh failed");
            }
        }
    }

    // ===== Per-item actions =====
    //
    // The authoritative write is awaited (its failure is the one
    // user-visible error in this subsystem); the follow-up refresh is
    // silent, so the feed never flickers on an action.

    pub async fn accept_request(&self, request_id: &str) -> Result<()> {
        self.backend.accept_request(request_id).await?;
        self.refresh(true).await
    }

    pub async fn decline_request(&self, request_id: &str) -> Result<()> {
        self.backend.decline_request(request_id).await?;
        self.refresh(true).await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<()> {
        self.backend.mark_notification_read(notification_id).await?;
        self.refresh(true).await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<()> {
        self.backend
            .mark_all_notifications_read(&self.viewer_id)
            .await?;
        self.refresh(true).await
    }
}
