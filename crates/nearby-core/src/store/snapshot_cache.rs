//! Two-tier snapshot cache for the last successfully computed feed.
//!
//! The memory tier is authoritative whenever it holds a key; the durable
//! tier (one JSON envelope file per key under the data dir) only exists so a
//! cold start can paint the previous feed before any network round trip.
//! Losing the durable copy degrades cold-start UX, never correctness, so
//! durable writes are fire-and-forget and failures are only logged.
//!
//! # Cache invalidation
//! A durable envelope is discarded when:
//! - `CACHE_SCHEMA_VERSION` is incremented (stored shape changed)
//! - the file is missing or corrupt
//! - the envelope is older than `MAX_CACHE_AGE_SECS`

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Increment whenever the cached feed shape changes in a way that would make
/// old snapshots unreadable. Old files are then silently discarded.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Maximum snapshot age in seconds (7 days).
const MAX_CACHE_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Versioned envelope wrapping one cached value on disk.
#[derive(Serialize, Deserialize)]
struct CacheEnvelope {
    schema_version: u32,
    /// Unix seconds when this snapshot was written.
    written_at: i64,
    value: serde_json::Value,
}

#[derive(Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
    memory: Arc<Mutex<HashMap<String, serde_json::Value>>>,
}

impl SnapshotCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            memory: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn file_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("snapshot_{safe}.json"))
    }

    /// Memory tier only. Never blocks on IO, never errors.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.memory.lock().get(key).cloned()
    }

    /// Write-through: memory immediately, durable tier in the background.
    /// Durable failure is swallowed (warn log only). Callable from outside a
    /// tokio runtime; the durable write then happens inline.
    pub fn set(&self, key: &str, value: serde_json::Value) {
        self.memory.lock().insert(key.to_string(), value.clone());

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                let key = key.to_string();
                handle.spawn_blocking(move || cache.persist_logged(&key, &value));
            }
            Err(_) => self.persist_logged(key, &value),
        }
    }

    fn persist_logged(&self, key: &str, value: &serde_json::Value) {
        if let Err(e) = self.persist(key, value) {
            tracing::warn!(key, error = %e, "snapshot_cache: durable write failed");
        }
    }

    /// Synchronous durable write: versioned envelope, temp-then-rename so an
    /// interrupted write can never leave a corrupt file behind.
    pub fn persist(&self, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        let envelope = CacheEnvelope {
            schema_version: CACHE_SCHEMA_VERSION,
            written_at: Utc::now().timestamp(),
            value: value.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        std::fs::create_dir_all(&self.dir)?;
        let file = self.file_for(key);
        let temp = file.with_extension("json.tmp");
        std::fs::write(&temp, &bytes)?;
        std::fs::rename(&temp, &file)?;
        Ok(())
    }

    /// Durable tier, consulted on a memory miss at cold start. A hit
    /// populates the memory tier. Returns `None` on any failure.
    pub fn load_durable(&self, key: &str) -> Option<serde_json::Value> {
        let bytes = std::fs::read(self.file_for(key)).ok()?;
        let envelope: CacheEnvelope = serde_json::from_slice(&bytes).ok()?;

        if envelope.schema_version != CACHE_SCHEMA_VERSION {
            tracing::info!(
                "snapshot_cache: schema version mismatch (cached={} current={}), discarding",
                envelope.schema_version,
                CACHE_SCHEMA_VERSION
            );
            return None;
        }

        let age = Utc::now().timestamp().saturating_sub(envelope.written_at);
        if age > MAX_CACHE_AGE_SECS {
            tracing::info!(
                "snapshot_cache: snapshot too old (age={}s max={}s), discarding",
                age,
                MAX_CACHE_AGE_SECS
            );
            return None;
        }

        self.memory
            .lock()
            .insert(key.to_string(), envelope.value.clone());
        Some(envelope.value)
    }

    /// Delete one key's durable file (e.g. on sign-out). Ignores errors.
    pub fn invalidate(&self, key: &str) {
        self.memory.lock().remove(key);
        let _ = std::fs::remove_file(self.file_for(key));
    }
}
