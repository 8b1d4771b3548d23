//! In-memory content source for tests and local development

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::source::{ContentSource, ListParams, RawContentItem};
use crate::{IndexError, PrincipalId, Result};

/// Content source over a fixed item list
///
/// A principal sees items they authored plus items explicitly granted to them.
#[derive(Default)]
pub struct StaticContentSource {
    items: RwLock<Vec<RawContentItem>>,
    grants: RwLock<HashSet<(PrincipalId, Uuid)>>,
    list_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl StaticContentSource {
    /// Items must already be ordered newest first
    pub fn new(items: Vec<RawContentItem>) -> Self {
        Self {
            items: RwLock::new(items),
            ..Self::default()
        }
    }

    pub fn grant(&self, principal: PrincipalId, item_id: Uuid) {
        if let Ok(mut grants) = self.grants.write() {
            grants.insert((principal, item_id));
        }
    }

    pub fn revoke(&self, principal: PrincipalId, item_id: Uuid) {
        if let Ok(mut grants) = self.grants.write() {
            grants.remove(&(principal, item_id));
        }
    }

    pub fn rename(&self, item_id: Uuid, title: &str) {
        if let Ok(mut items) = self.items.write() {
            if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
                item.title = title.to_string();
            }
        }
    }

    /// Make every call fail with `ContentSourceUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::ContentSourceUnavailable(
                "static source switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for StaticContentSource {
    async fn list_content(&self, params: &ListParams) -> Result<Vec<RawContentItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let items = self
            .items
            .read()
            .map_err(|e| IndexError::ContentSourceUnavailable(e.to_string()))?;
        Ok(items.iter().take(params.limit).cloned().collect())
    }

    async fn can_view(&self, principal: &PrincipalId, item: &RawContentItem) -> Result<bool> {
        self.check_available()?;

        if item.author_id == principal.0 {
            return Ok(true);
        }
        let grants = self
            .grants
            .read()
            .map_err(|e| IndexError::ContentSourceUnavailable(e.to_string()))?;
        Ok(grants.contains(&(*principal, item.id)))
    }
}

/// Build `count` items by `author`, newest first, titled "Item 0", "Item 1", ...
pub fn sample_items(author: Uuid, count: usize) -> Vec<RawContentItem> {
    let newest = Utc::now();
    (0..count)
        .map(|i| RawContentItem {
            id: Uuid::new_v4(),
            title: format!("Item {}", i),
            content_type: if i % 2 == 0 { "post" } else { "page" }.to_string(),
            status: "publish".to_string(),
            author_id: author,
            modified_at: newest - Duration::minutes(i as i64),
        })
        .collect()
}
