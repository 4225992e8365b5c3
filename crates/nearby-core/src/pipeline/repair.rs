//! Consistency repair for the pending-request stream.
//!
//! The request stream and the authoritative connection state can disagree:
//! the receiver may already be connected to a sender via a request that went
//! through another path. Such pending rows are lies; they are dropped from
//! the feed immediately and transitioned to declined in the background so
//! they don't resurface on the next fetch.
//!
//! The decline write is conditional on the row still being pending, so the
//! repair is idempotent: replaying it against an already-declined row is a
//! no-op at the backend.

use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::Backend;
use crate::models::ConnectionRequest;

/// Splits `pending` into requests to keep and the ids of stale ones whose
/// sender is already connected to the viewer (in either direction).
///
/// When the accepted-connection lookup itself fails, nothing is repaired;
/// the full pending list is kept and the repair retries on the next run.
pub async fn repair_pending_requests(
    backend: &dyn Backend,
    viewer_id: &str,
    pending: Vec<ConnectionRequest>,
) -> (Vec<ConnectionRequest>, Vec<String>) {
    if pending.is_empty() {
        return (pending, Vec::new());
    }

    let sender_ids: Vec<String> = pending.iter().map(|r| r.sender_id.clone()).collect();

    let accepted = match backend.fetch_accepted_between(viewer_id, &sender_ids).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "accepted-connection lookup failed, skipping repair");
            return (pending, Vec::new());
        }
    };

    let connected_senders: HashSet<&str> = accepted
        .iter()
        .filter(|row| sender_ids.iter().any(|s| row.links(viewer_id, s)))
        .flat_map(|row| [row.sender_id.as_str(), row.receiver_id.as_str()])
        .filter(|id| *id != viewer_id)
        .collect();

    let mut kept = Vec::with_capacity(pending.len());
    let mut stale_ids = Vec::new();
    for request in pending {
        if connected_senders.contains(request.sender_id.as_str()) {
            stale_ids.push(request.id);
        } else {
            kept.push(request);
        }
    }

    if !stale_ids.is_empty() {
        tracing::info!(count = stale_ids.len(), "dropping stale pending requests");
    }

    (kept, stale_ids)
}

/// Corrective writes for stale requests. Fire-and-forget from the feed's
/// perspective: the engine spawns this and publishes without awaiting it.
/// Failures are logged only; the next run repairs again.
pub async fn issue_declines(backend: Arc<dyn Backend>, stale_ids: Vec<String>) {
    futures::future::join_all(stale_ids.into_iter().map(|id| {
        let backend = backend.clone();
        async move {
            if let Err(e) = backend.decline_request(&id).await {
                tracing::warn!(request_id = %id, error = %e, "stale-request decline failed");
            }
        }
    }))
    .await;
}
