//! Staleness oracle
//!
//! An index is fresh only while the global invalidation mark is strictly older
//! than its build time. A tie counts as stale.

use std::sync::Arc;
use tracing::debug;

use crate::store::TimestampStore;
use crate::trigger::GlobalMark;
use crate::{PrincipalId, Result, Timestamp};

pub struct StalenessOracle {
    store: Arc<dyn TimestampStore>,
    mark: GlobalMark,
}

impl StalenessOracle {
    pub fn new(store: Arc<dyn TimestampStore>, mark: GlobalMark) -> Self {
        Self { store, mark }
    }

    pub async fn is_stale(&self, principal: &PrincipalId) -> Result<bool> {
        let mark = self.mark.current().await?;
        let built_at = self.store.principal_build_time(principal).await?;
        let stale = is_stale_at(mark, built_at);

        debug!(principal = %principal, mark, ?built_at, stale, "Staleness checked");
        Ok(stale)
    }
}

/// A missing build time is older than any mark
pub fn is_stale_at(mark: Timestamp, built_at: Option<Timestamp>) -> bool {
    match built_at {
        Some(built_at) => mark >= built_at,
        None => true,
    }
}
