//! Content source contract
//!
//! The host platform owns content listing and per-item authorization; the
//! index only ever reads through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PrincipalId, Result};

/// Raw content item as listed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContentItem {
    pub id: Uuid,
    pub title: String,
    pub content_type: String,
    pub status: String,
    pub author_id: Uuid,
    pub modified_at: DateTime<Utc>,
}

/// Listing parameters handed to the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    /// Upper bound on returned items
    pub limit: usize,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// List at most `params.limit` items, most recently modified first
    async fn list_content(&self, params: &ListParams) -> Result<Vec<RawContentItem>>;

    async fn can_view(&self, principal: &PrincipalId, item: &RawContentItem) -> Result<bool>;

    /// Keep the items `principal` may view, in their original order
    ///
    /// Defaults to one `can_view` per item. Sources that can answer for a
    /// whole batch at once should override it.
    async fn filter_viewable(
        &self,
        principal: &PrincipalId,
        items: Vec<RawContentItem>,
    ) -> Result<Vec<RawContentItem>> {
        let mut viewable = Vec::with_capacity(items.len());
        for item in items {
            if self.can_view(principal, &item).await? {
                viewable.push(item);
            }
        }
        Ok(viewable)
    }
}
