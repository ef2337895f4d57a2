//! Client preferences persisted between sessions.

use serde::{Deserialize, Serialize};

use super::{clamp_limit, DEFAULT_LIMIT};

/// Last-used search text and page size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            q: String::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Partial update applied by [`Preferences::hydrate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Preferences {
    pub fn set_query(&mut self, q: impl Into<String>) {
        self.q = q.into();
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = clamp_limit(limit);
    }

    pub fn hydrate(&mut self, patch: PreferencesPatch) {
        if let Some(q) = patch.q {
            self.set_query(q);
        }
        if let Some(limit) = patch.limit {
            self.set_limit(limit);
        }
    }

    /// The filter to send, or `None` when the search box is empty.
    pub fn filter(&self) -> Option<&str> {
        let q = self.q.trim();
        (!q.is_empty()).then_some(q)
    }
}
