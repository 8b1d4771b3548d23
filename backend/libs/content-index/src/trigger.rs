//! Invalidation trigger
//!
//! Content mutations bump the single global mark, which makes every index
//! built before it stale. Only the acting principal is rebuilt right away;
//! everyone else rebuilds lazily on their next lookup.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::controller::IndexCacheController;
use crate::store::TimestampStore;
use crate::{Clock, IndexConfig, PrincipalId, Result, Timestamp};

/// Handle on the process-wide invalidation mark
#[derive(Clone)]
pub struct GlobalMark {
    store: Arc<dyn TimestampStore>,
    clock: Arc<dyn Clock>,
}

impl GlobalMark {
    pub fn new(store: Arc<dyn TimestampStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Set the mark to now, unconditionally
    pub async fn bump(&self) -> Result<Timestamp> {
        let now = self.clock.now();
        self.store.set_global_mark(now).await?;
        info!(mark = now, "Global invalidation mark bumped");
        Ok(now)
    }

    /// Read the mark, initialising it on first use
    ///
    /// Initialisation is itself an invalidation.
    pub async fn current(&self) -> Result<Timestamp> {
        match self.store.global_mark().await? {
            Some(mark) => Ok(mark),
            None => {
                debug!("Global invalidation mark missing, initialising");
                self.bump().await
            }
        }
    }
}

/// Content snapshot carried by an update event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum InvalidationOutcome {
    /// Event did not qualify; nothing was written
    Ignored,
    Invalidated {
        mark: Timestamp,
        rebuilt_at: Timestamp,
    },
}

impl InvalidationOutcome {
    pub fn is_invalidated(&self) -> bool {
        matches!(self, InvalidationOutcome::Invalidated { .. })
    }
}

pub struct InvalidationTrigger {
    mark: GlobalMark,
    controller: Arc<IndexCacheController>,
    config: Arc<IndexConfig>,
}

impl InvalidationTrigger {
    pub fn new(
        mark: GlobalMark,
        controller: Arc<IndexCacheController>,
        config: Arc<IndexConfig>,
    ) -> Self {
        Self {
            mark,
            controller,
            config,
        }
    }

    pub async fn bump_global_mark(&self) -> Result<Timestamp> {
        self.mark.bump().await
    }

    /// Invalidate when an update changed the title
    pub async fn on_content_updated(
        &self,
        principal: &PrincipalId,
        before: &ContentSnapshot,
        after: &ContentSnapshot,
    ) -> Result<InvalidationOutcome> {
        if before.title == after.title {
            debug!(content_id = %after.id, "Title unchanged, skipping invalidation");
            return Ok(InvalidationOutcome::Ignored);
        }

        info!(content_id = %after.id, principal = %principal, "Title changed");
        self.invalidate(principal).await
    }

    /// Invalidate when an item leaves the placeholder status
    pub async fn on_content_status_transition(
        &self,
        principal: &PrincipalId,
        old_status: &str,
        new_status: &str,
    ) -> Result<InvalidationOutcome> {
        if !self.is_creation(old_status, new_status) {
            debug!(old_status, new_status, "Status transition ignored");
            return Ok(InvalidationOutcome::Ignored);
        }

        info!(old_status, new_status, principal = %principal, "Content created");
        self.invalidate(principal).await
    }

    fn is_creation(&self, old_status: &str, new_status: &str) -> bool {
        let placeholder = self.config.placeholder_status.as_str();
        old_status == placeholder && new_status != placeholder
    }

    async fn invalidate(&self, principal: &PrincipalId) -> Result<InvalidationOutcome> {
        let mark = self.mark.bump().await?;
        let index = self.controller.rebuild(principal).await?;

        Ok(InvalidationOutcome::Invalidated {
            mark,
            rebuilt_at: index.built_at,
        })
    }
}
