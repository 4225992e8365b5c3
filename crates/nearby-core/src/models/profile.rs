use serde::{Deserialize, Serialize};

/// Minimal profile projection used by feed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Stand-in identity for a profile that failed to resolve.
    /// Feed items are emitted with this rather than being dropped.
    pub fn placeholder(id: &str) -> Self {
        // Truncate on char boundaries; ids are not guaranteed ASCII.
        let prefix: String = id.chars().take(8).collect();
        Self {
            id: id.to_string(),
            display_name: format!("{prefix}..."),
            avatar_url: None,
        }
    }
}
