//! Tag query filter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tag filter with AND semantics.
///
/// An empty tag set matches every live document in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Query {
    /// Query that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
