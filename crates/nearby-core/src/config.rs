use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the hosted backend's REST facade.
    pub backend_url: String,
    pub api_key: String,
    /// Profile id of the signed-in viewer; every query is scoped to it.
    pub viewer_id: String,
    /// Directory holding the durable snapshot-cache tier.
    pub data_dir: PathBuf,
    /// Fallback event length when the backend stores neither an end time
    /// nor a duration.
    pub default_event_duration_minutes: i64,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(
        backend_url: impl Into<String>,
        api_key: impl Into<String>,
        viewer_id: impl Into<String>,
        data_dir: P,
    ) -> Self {
        Self {
            backend_url: backend_url.into(),
            api_key: api_key.into(),
            viewer_id: viewer_id.into(),
            data_dir: data_dir.as_ref().to_path_buf(),
            default_event_duration_minutes: 120,
        }
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nearby")
    }
}
