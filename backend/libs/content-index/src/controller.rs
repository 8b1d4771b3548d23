//! Index cache controller
//!
//! "Get or rebuild" over the timestamp store. A miss always triggers a full
//! rebuild; there is no incremental path and no locking. Two concurrent misses
//! for one principal both rebuild and the later write wins.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::builder::IndexBuilder;
use crate::oracle::StalenessOracle;
use crate::store::TimestampStore;
use crate::{Clock, ContentRecord, PrincipalId, PrincipalIndex, Result, Timestamp};

/// Added to the build time so a mark written in the same second as a
/// rebuild does not immediately mark that rebuild stale.
pub const BUILD_TIME_BIAS_SECS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexLookup {
    pub items: Vec<ContentRecord>,
    pub built_at: Timestamp,
    pub outcome: CacheOutcome,
}

pub struct IndexCacheController {
    store: Arc<dyn TimestampStore>,
    oracle: StalenessOracle,
    builder: IndexBuilder,
    clock: Arc<dyn Clock>,
}

impl IndexCacheController {
    pub fn new(
        store: Arc<dyn TimestampStore>,
        oracle: StalenessOracle,
        builder: IndexBuilder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            oracle,
            builder,
            clock,
        }
    }

    pub async fn get_index(&self, principal: &PrincipalId) -> Result<Vec<ContentRecord>> {
        Ok(self.lookup(principal).await?.items)
    }

    /// Serve the cached index, rebuilding it first when stale
    pub async fn lookup(&self, principal: &PrincipalId) -> Result<IndexLookup> {
        if !self.oracle.is_stale(principal).await? {
            // A build time without its payload is treated like a miss.
            if let Some(index) = self.store.principal_index(principal).await? {
                debug!(principal = %principal, items = index.items.len(), "Content index cache HIT");
                return Ok(IndexLookup {
                    items: index.items,
                    built_at: index.built_at,
                    outcome: CacheOutcome::Hit,
                });
            }
        }

        debug!(principal = %principal, "Content index cache MISS");
        let index = self.rebuild(principal).await?;
        Ok(IndexLookup {
            items: index.items,
            built_at: index.built_at,
            outcome: CacheOutcome::Miss,
        })
    }

    /// Build and persist a fresh index, replacing whatever was cached
    pub async fn rebuild(&self, principal: &PrincipalId) -> Result<PrincipalIndex> {
        let started = Instant::now();
        let items = self.builder.build(principal).await?;
        let index = PrincipalIndex {
            items,
            built_at: self.clock.now() + BUILD_TIME_BIAS_SECS,
        };
        self.store.set_principal_index(principal, &index).await?;

        info!(
            principal = %principal,
            items = index.items.len(),
            built_at = index.built_at,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Content index rebuilt"
        );
        Ok(index)
    }

    /// Current build time, building the index if it has never been built
    pub async fn build_timestamp(&self, principal: &PrincipalId) -> Result<Timestamp> {
        match self.store.principal_build_time(principal).await? {
            Some(built_at) => Ok(built_at),
            None => Ok(self.rebuild(principal).await?.built_at),
        }
    }
}
