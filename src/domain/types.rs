//! Small shared value types.

use serde::{Deserialize, Serialize};

/// Sort order for preset listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetSort {
    /// Most-liked first, ties broken by recency.
    Likes,
    /// Most recently created first.
    Newest,
}

impl PresetSort {
    pub const ALL: [PresetSort; 2] = [PresetSort::Likes, PresetSort::Newest];

    /// Stable discriminator used in cache keys and query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            PresetSort::Likes => "likes",
            PresetSort::Newest => "new",
        }
    }
}
