//! End-to-end tests for the content index
//!
//! Everything runs against the in-memory store and a manual clock, except the
//! Redis round trip, which requires a running Redis instance.
//! Run it with: cargo test --test index_flow_test -- --ignored

use content_index::testing::{sample_items, StaticContentSource};
use content_index::{
    CacheOutcome, ContentIndex, ContentSnapshot, IndexConfig, IndexError, InvalidationOutcome,
    ManualClock, MemoryTimestampStore, PrincipalId, PrincipalIndex, RedisTimestampStore,
    TimestampStore,
};
use std::sync::Arc;
use uuid::Uuid;

const REDIS_URL: &str = "redis://127.0.0.1:6379";

struct Harness {
    index: ContentIndex,
    store: Arc<MemoryTimestampStore>,
    source: Arc<StaticContentSource>,
    clock: Arc<ManualClock>,
    author: PrincipalId,
}

fn harness(item_count: usize, config: IndexConfig) -> Harness {
    let author = PrincipalId(Uuid::new_v4());
    let store = Arc::new(MemoryTimestampStore::new());
    let source = Arc::new(StaticContentSource::new(sample_items(author.0, item_count)));
    let clock = Arc::new(ManualClock::new(100));
    let index = ContentIndex::new(store.clone(), source.clone(), clock.clone(), config);

    Harness {
        index,
        store,
        source,
        clock,
        author,
    }
}

fn snapshot(id: Uuid, title: &str) -> ContentSnapshot {
    ContentSnapshot {
        id,
        title: title.to_string(),
    }
}

#[tokio::test]
async fn test_first_lookup_initialises_mark_and_caches() {
    let h = harness(3, IndexConfig::default());
    assert_eq!(h.store.global_mark().await.unwrap(), None);

    let first = h.index.controller().lookup(&h.author).await.unwrap();
    assert_eq!(first.outcome, CacheOutcome::Miss);
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.built_at, 101);
    assert_eq!(h.store.global_mark().await.unwrap(), Some(100));
    assert_eq!(h.source.list_calls(), 1);

    // Same tick: served from cache without touching the source.
    let second = h.index.controller().lookup(&h.author).await.unwrap();
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(second.items, first.items);
    assert_eq!(h.source.list_calls(), 1);
}

#[tokio::test]
async fn test_title_change_forces_rebuild_on_next_lookup() {
    let h = harness(2, IndexConfig::default());
    let other = PrincipalId(Uuid::new_v4());

    // Build at t=100 for a principal that does not trigger the event.
    h.index.controller().get_index(&other).await.unwrap();
    assert_eq!(h.store.principal_build_time(&other).await.unwrap(), Some(101));

    h.clock.set(150);
    let id = Uuid::new_v4();
    let outcome = h
        .index
        .trigger()
        .on_content_updated(&h.author, &snapshot(id, "Draft"), &snapshot(id, "Final"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        InvalidationOutcome::Invalidated {
            mark: 150,
            rebuilt_at: 151
        }
    );
    assert_eq!(h.store.global_mark().await.unwrap(), Some(150));

    // The acting principal was rebuilt eagerly and stays fresh.
    let acting = h.index.controller().lookup(&h.author).await.unwrap();
    assert_eq!(acting.outcome, CacheOutcome::Hit);
    assert_eq!(acting.built_at, 151);

    // Everyone else rebuilds lazily.
    let lookup = h.index.controller().lookup(&other).await.unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Miss);
    assert_eq!(lookup.built_at, 151);
}

#[tokio::test]
async fn test_unchanged_title_is_ignored() {
    let h = harness(2, IndexConfig::default());
    h.index.controller().get_index(&h.author).await.unwrap();
    let calls = h.source.list_calls();

    h.clock.set(200);
    let id = Uuid::new_v4();
    let outcome = h
        .index
        .trigger()
        .on_content_updated(&h.author, &snapshot(id, "Same"), &snapshot(id, "Same"))
        .await
        .unwrap();

    assert_eq!(outcome, InvalidationOutcome::Ignored);
    assert_eq!(h.store.global_mark().await.unwrap(), Some(100));
    assert_eq!(h.source.list_calls(), calls);
}

#[tokio::test]
async fn test_status_transition_policy() {
    let h = harness(1, IndexConfig::default());
    h.index.controller().get_index(&h.author).await.unwrap();
    let trigger = h.index.trigger();

    h.clock.set(300);
    let ignored = trigger
        .on_content_status_transition(&h.author, "draft", "publish")
        .await
        .unwrap();
    assert_eq!(ignored, InvalidationOutcome::Ignored);
    assert_eq!(h.store.global_mark().await.unwrap(), Some(100));

    let ignored = trigger
        .on_content_status_transition(&h.author, "auto-draft", "auto-draft")
        .await
        .unwrap();
    assert_eq!(ignored, InvalidationOutcome::Ignored);

    let created = trigger
        .on_content_status_transition(&h.author, "auto-draft", "draft")
        .await
        .unwrap();
    assert!(created.is_invalidated());
    assert_eq!(h.store.global_mark().await.unwrap(), Some(300));
}

#[tokio::test]
async fn test_custom_placeholder_status() {
    let config = IndexConfig {
        placeholder_status: "new".to_string(),
        ..IndexConfig::default()
    };
    let h = harness(1, config);

    let outcome = h
        .index
        .trigger()
        .on_content_status_transition(&h.author, "auto-draft", "publish")
        .await
        .unwrap();
    assert_eq!(outcome, InvalidationOutcome::Ignored);

    let outcome = h
        .index
        .trigger()
        .on_content_status_transition(&h.author, "new", "publish")
        .await
        .unwrap();
    assert!(outcome.is_invalidated());
}

#[tokio::test]
async fn test_same_tick_bump_does_not_stale_fresh_build() {
    let h = harness(1, IndexConfig::default());
    let controller = h.index.controller();

    // Bump and rebuild both land at T=100, built_at = 101.
    h.index.trigger().bump_global_mark().await.unwrap();
    controller.rebuild(&h.author).await.unwrap();

    h.index.trigger().bump_global_mark().await.unwrap();
    let lookup = controller.lookup(&h.author).await.unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Hit);

    h.clock.advance(1);
    h.index.trigger().bump_global_mark().await.unwrap();
    let lookup = controller.lookup(&h.author).await.unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Miss);
    assert_eq!(lookup.built_at, 102);
}

#[tokio::test]
async fn test_bump_stales_only_builds_that_predate_it() {
    let h = harness(1, IndexConfig::default());
    let early = PrincipalId(Uuid::new_v4());
    let late = PrincipalId(Uuid::new_v4());
    let controller = h.index.controller();

    controller.rebuild(&early).await.unwrap(); // built_at 101
    h.clock.set(120);
    controller.rebuild(&late).await.unwrap(); // built_at 121

    h.clock.set(110);
    h.index.trigger().bump_global_mark().await.unwrap();

    assert_eq!(controller.lookup(&early).await.unwrap().outcome, CacheOutcome::Miss);
    assert_eq!(controller.lookup(&late).await.unwrap().outcome, CacheOutcome::Hit);
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let h = harness(10, IndexConfig::default());
    let controller = h.index.controller();

    let first = controller.rebuild(&h.author).await.unwrap();
    h.clock.advance(1);
    let second = controller.rebuild(&h.author).await.unwrap();

    assert_eq!(first.items, second.items);
    assert_eq!(second.built_at, first.built_at + 1);
}

#[tokio::test]
async fn test_visibility_filtering_and_order() {
    let owner = PrincipalId(Uuid::new_v4());
    let viewer = PrincipalId(Uuid::new_v4());
    let items = sample_items(owner.0, 6);
    let granted = [items[1].id, items[4].id];

    let store = Arc::new(MemoryTimestampStore::new());
    let source = Arc::new(StaticContentSource::new(items.clone()));
    for id in granted {
        source.grant(viewer, id);
    }
    let clock = Arc::new(ManualClock::new(100));
    let index = ContentIndex::new(store, source.clone(), clock.clone(), IndexConfig::default());

    let visible = index.controller().get_index(&viewer).await.unwrap();
    let titles: Vec<&str> = visible.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Item 1", "Item 4"]);
    assert_eq!(visible[0].content_type, "page");
    assert_eq!(visible[0].url, format!("/admin/content/{}/edit", items[1].id));

    // Revoking does not touch the cached copy until the next rebuild.
    source.revoke(viewer, granted[0]);
    assert_eq!(index.controller().get_index(&viewer).await.unwrap().len(), 2);

    clock.advance(5);
    index.trigger().bump_global_mark().await.unwrap();
    let rebuilt = index.controller().get_index(&viewer).await.unwrap();
    assert_eq!(rebuilt.len(), 1);
    assert_eq!(rebuilt[0].title, "Item 4");
}

#[tokio::test]
async fn test_limit_truncation_never_looks_past_limit() {
    let owner = PrincipalId(Uuid::new_v4());
    let viewer = PrincipalId(Uuid::new_v4());
    let items = sample_items(owner.0, 8);

    let source = Arc::new(StaticContentSource::new(items.clone()));
    source.grant(viewer, items[2].id);
    source.grant(viewer, items[6].id);
    let index = ContentIndex::new(
        Arc::new(MemoryTimestampStore::new()),
        source,
        Arc::new(ManualClock::new(100)),
        IndexConfig::default().with_results_limit(5),
    );

    let visible = index.controller().get_index(&viewer).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Item 2");

    let everything = index.controller().get_index(&owner).await.unwrap();
    assert_eq!(everything.len(), 5);
}

#[tokio::test]
async fn test_titles_are_escaped() {
    let author = PrincipalId(Uuid::new_v4());
    let item = sample_items(author.0, 1).remove(0);
    let source = Arc::new(StaticContentSource::new(vec![item.clone()]));
    source.rename(item.id, "<b>Q&A</b> &amp; more");
    let index = ContentIndex::new(
        Arc::new(MemoryTimestampStore::new()),
        source,
        Arc::new(ManualClock::new(100)),
        IndexConfig::default(),
    );

    let records = index.controller().get_index(&author).await.unwrap();
    assert_eq!(records[0].title, "&lt;b&gt;Q&amp;A&lt;/b&gt; &amp; more");
    assert_eq!(records[0].content_type, "post");
}

#[tokio::test]
async fn test_empty_index_is_cached() {
    let h = harness(0, IndexConfig::default());

    let first = h.index.controller().lookup(&h.author).await.unwrap();
    assert!(first.items.is_empty());
    let second = h.index.controller().lookup(&h.author).await.unwrap();
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(h.source.list_calls(), 1);
}

#[tokio::test]
async fn test_source_failure_leaves_cache_untouched() {
    let h = harness(3, IndexConfig::default());
    let before = h.index.controller().rebuild(&h.author).await.unwrap();

    h.clock.advance(10);
    h.index.trigger().bump_global_mark().await.unwrap();
    h.source.set_unavailable(true);

    let err = h.index.controller().get_index(&h.author).await.unwrap_err();
    assert!(matches!(err, IndexError::ContentSourceUnavailable(_)));
    assert_eq!(
        h.store.principal_index(&h.author).await.unwrap(),
        Some(before)
    );
}

#[tokio::test]
async fn test_build_timestamp_builds_lazily() {
    let h = harness(2, IndexConfig::default());
    let controller = h.index.controller();

    assert_eq!(controller.build_timestamp(&h.author).await.unwrap(), 101);
    assert_eq!(h.source.list_calls(), 1);

    h.clock.advance(50);
    assert_eq!(controller.build_timestamp(&h.author).await.unwrap(), 101);
    assert_eq!(h.source.list_calls(), 1);
}

#[tokio::test]
async fn test_build_time_without_payload_is_a_miss() {
    struct Split(MemoryTimestampStore);

    #[async_trait::async_trait]
    impl TimestampStore for Split {
        async fn global_mark(&self) -> content_index::Result<Option<i64>> {
            self.0.global_mark().await
        }
        async fn set_global_mark(&self, mark: i64) -> content_index::Result<()> {
            self.0.set_global_mark(mark).await
        }
        async fn principal_build_time(
            &self,
            _principal: &PrincipalId,
        ) -> content_index::Result<Option<i64>> {
            Ok(Some(i64::MAX))
        }
        async fn set_principal_index(
            &self,
            principal: &PrincipalId,
            index: &PrincipalIndex,
        ) -> content_index::Result<()> {
            self.0.set_principal_index(principal, index).await
        }
        async fn principal_index(
            &self,
            _principal: &PrincipalId,
        ) -> content_index::Result<Option<PrincipalIndex>> {
            Ok(None)
        }
    }

    let author = PrincipalId(Uuid::new_v4());
    let source = Arc::new(StaticContentSource::new(sample_items(author.0, 2)));
    let index = ContentIndex::new(
        Arc::new(Split(MemoryTimestampStore::new())),
        source.clone(),
        Arc::new(ManualClock::new(100)),
        IndexConfig::default(),
    );

    let lookup = index.controller().lookup(&author).await.unwrap();
    assert_eq!(lookup.outcome, CacheOutcome::Miss);
    assert_eq!(lookup.items.len(), 2);
    assert_eq!(source.list_calls(), 1);
}

/// Store whose every call fails as if Redis were down
struct UnavailableStore;

#[async_trait::async_trait]
impl TimestampStore for UnavailableStore {
    async fn global_mark(&self) -> content_index::Result<Option<i64>> {
        Err(IndexError::StoreUnavailable("down".to_string()))
    }
    async fn set_global_mark(&self, _mark: i64) -> content_index::Result<()> {
        Err(IndexError::StoreUnavailable("down".to_string()))
    }
    async fn principal_build_time(
        &self,
        _principal: &PrincipalId,
    ) -> content_index::Result<Option<i64>> {
        Err(IndexError::StoreUnavailable("down".to_string()))
    }
    async fn set_principal_index(
        &self,
        _principal: &PrincipalId,
        _index: &PrincipalIndex,
    ) -> content_index::Result<()> {
        Err(IndexError::StoreUnavailable("down".to_string()))
    }
    async fn principal_index(
        &self,
        _principal: &PrincipalId,
    ) -> content_index::Result<Option<PrincipalIndex>> {
        Err(IndexError::StoreUnavailable("down".to_string()))
    }
}

#[tokio::test]
async fn test_store_failure_reaches_the_caller() {
    let author = PrincipalId(Uuid::new_v4());
    let source = Arc::new(StaticContentSource::new(sample_items(author.0, 2)));
    let index = ContentIndex::new(
        Arc::new(UnavailableStore),
        source.clone(),
        Arc::new(ManualClock::new(100)),
        IndexConfig::default(),
    );

    let result = index.controller().get_index(&author).await;
    assert!(matches!(result, Err(IndexError::StoreUnavailable(ref msg)) if msg == "down"));
    assert_eq!(source.list_calls(), 0);

    let result = index.controller().build_timestamp(&author).await;
    assert!(matches!(result, Err(IndexError::StoreUnavailable(_))));
    assert_eq!(source.list_calls(), 0);

    let id = Uuid::new_v4();
    let result = index
        .trigger()
        .on_content_updated(&author, &snapshot(id, "Old"), &snapshot(id, "New"))
        .await;
    assert!(matches!(result, Err(IndexError::StoreUnavailable(_))));
    assert_eq!(source.list_calls(), 0);
}

#[tokio::test]
async fn test_builder_uses_batch_visibility() {
    /// Answers visibility only in bulk: the author's items, every other one skipped
    struct BulkSource {
        items: Vec<content_index::RawContentItem>,
    }

    #[async_trait::async_trait]
    impl content_index::ContentSource for BulkSource {
        async fn list_content(
            &self,
            params: &content_index::ListParams,
        ) -> content_index::Result<Vec<content_index::RawContentItem>> {
            Ok(self.items.iter().take(params.limit).cloned().collect())
        }

        async fn can_view(
            &self,
            _principal: &PrincipalId,
            _item: &content_index::RawContentItem,
        ) -> content_index::Result<bool> {
            Err(IndexError::ContentSourceUnavailable(
                "per-item visibility is not supported".to_string(),
            ))
        }

        async fn filter_viewable(
            &self,
            principal: &PrincipalId,
            items: Vec<content_index::RawContentItem>,
        ) -> content_index::Result<Vec<content_index::RawContentItem>> {
            Ok(items
                .into_iter()
                .enumerate()
                .filter(|(i, item)| item.author_id == principal.0 && i % 2 == 0)
                .map(|(_, item)| item)
                .collect())
        }
    }

    let author = PrincipalId(Uuid::new_v4());
    let index = ContentIndex::new(
        Arc::new(MemoryTimestampStore::new()),
        Arc::new(BulkSource {
            items: sample_items(author.0, 5),
        }),
        Arc::new(ManualClock::new(100)),
        IndexConfig::default(),
    );

    let titles: Vec<String> = index
        .controller()
        .get_index(&author)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.title)
        .collect();
    assert_eq!(titles, vec!["Item 0", "Item 2", "Item 4"]);
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_redis_store_round_trip() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = RedisTimestampStore::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis");
    let principal = PrincipalId(Uuid::new_v4());

    store.set_global_mark(1_700_000_000).await.unwrap();
    assert_eq!(store.global_mark().await.unwrap(), Some(1_700_000_000));

    assert_eq!(store.principal_index(&principal).await.unwrap(), None);
    assert_eq!(store.principal_build_time(&principal).await.unwrap(), None);

    let index = PrincipalIndex {
        items: vec![content_index::ContentRecord {
            title: "Q&amp;A".to_string(),
            content_type: "page".to_string(),
            url: "/admin/content/1/edit".to_string(),
        }],
        built_at: 1_700_000_001,
    };
    store.set_principal_index(&principal, &index).await.unwrap();

    assert_eq!(
        store.principal_build_time(&principal).await.unwrap(),
        Some(1_700_000_001)
    );
    assert_eq!(store.principal_index(&principal).await.unwrap(), Some(index));
}
