//! Index records and per-principal cache entries

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Timestamp;

/// Authenticated actor an index is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub Uuid);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(id: Uuid) -> Self {
        PrincipalId(id)
    }
}

/// One navigable entry in an index
///
/// `title` is already HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub title: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub url: String,
}

/// Cached index belonging to one principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalIndex {
    pub items: Vec<ContentRecord>,
    pub built_at: Timestamp,
}
