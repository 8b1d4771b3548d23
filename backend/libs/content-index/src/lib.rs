//! Per-principal content index with lazy invalidation
//!
//! Each principal gets a cached list of the content items they may open,
//! rebuilt only when a single shared invalidation mark moves past it.
//!
//! # Architecture
//!
//! ```text
//! Mutation event (title change, first publish):
//!   1. InvalidationTrigger bumps the global mark:
//!      SET content_index:global:invalidated_at <now>
//!   2. Acting principal's index is rebuilt immediately
//!
//! Read (GET /content-index/):
//!   1. StalenessOracle: stale iff global mark >= principal built_at
//!   2. Fresh  -> cached items
//!      Stale  -> IndexBuilder -> ContentSource (list + filter_viewable)
//!             -> store items with built_at = now + 1
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use content_index::{
//!     ContentIndex, ContentSource, IndexConfig, ListParams, PrincipalId, RawContentItem,
//!     RedisTimestampStore, SystemClock,
//! };
//!
//! /// Host-side listing; here every principal sees nothing
//! struct HostContent;
//!
//! #[async_trait]
//! impl ContentSource for HostContent {
//!     async fn list_content(
//!         &self,
//!         _params: &ListParams,
//!     ) -> content_index::Result<Vec<RawContentItem>> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn can_view(
//!         &self,
//!         _principal: &PrincipalId,
//!         _item: &RawContentItem,
//!     ) -> content_index::Result<bool> {
//!         Ok(false)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(RedisTimestampStore::connect("redis://localhost:6379").await?);
//!     let source = Arc::new(HostContent);
//!     let index = ContentIndex::new(store, source, Arc::new(SystemClock), IndexConfig::default());
//!
//!     let principal = PrincipalId(uuid::Uuid::new_v4());
//!     let items = index.controller().get_index(&principal).await?;
//!     println!("{} items", items.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod builder;
pub mod clock;
pub mod config;
pub mod controller;
mod error;
pub mod helpers;
pub mod models;
pub mod oracle;
pub mod source;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trigger;

pub use builder::IndexBuilder;
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{IndexConfig, Shortcut};
pub use controller::{CacheOutcome, IndexCacheController, IndexLookup};
pub use error::IndexError;
pub use models::{ContentRecord, PrincipalId, PrincipalIndex};
pub use oracle::StalenessOracle;
pub use source::{ContentSource, ListParams, RawContentItem};
pub use store::{MemoryTimestampStore, RedisTimestampStore, TimestampStore};
pub use trigger::{ContentSnapshot, GlobalMark, InvalidationOutcome, InvalidationTrigger};

pub type Result<T> = std::result::Result<T, IndexError>;

/// Fully wired controller and trigger sharing one store, clock and config
#[derive(Clone)]
pub struct ContentIndex {
    controller: Arc<IndexCacheController>,
    trigger: Arc<InvalidationTrigger>,
    config: Arc<IndexConfig>,
}

impl ContentIndex {
    pub fn new(
        store: Arc<dyn TimestampStore>,
        source: Arc<dyn ContentSource>,
        clock: Arc<dyn Clock>,
        config: IndexConfig,
    ) -> Self {
        let config = Arc::new(config);
        let mark = GlobalMark::new(store.clone(), clock.clone());
        let oracle = StalenessOracle::new(store.clone(), mark.clone());
        let builder = IndexBuilder::new(source, config.clone());
        let controller = Arc::new(IndexCacheController::new(store, oracle, builder, clock));
        let trigger = Arc::new(InvalidationTrigger::new(
            mark,
            controller.clone(),
            config.clone(),
        ));

        Self {
            controller,
            trigger,
            config,
        }
    }

    pub fn controller(&self) -> &Arc<IndexCacheController> {
        &self.controller
    }

    pub fn trigger(&self) -> &Arc<InvalidationTrigger> {
        &self.trigger
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }
}
