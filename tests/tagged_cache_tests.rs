//! Integration tests for tagged views over the memory store
//!
//! These tests verify:
//! - Put/get under a tag set and invalidation by flush
//! - Isolation between disjoint tag sets
//! - Partial overlap invalidation through a shared tag
//! - Absolute-time expiry and the `remember` family on tagged repositories

use chrono::{Duration as ChronoDuration, Utc};
use ouroboros_cache::{
    sha1_hex, tagged_key, CacheError, FileStore, MemoryStore, Repository, Store, TagSet,
};
use serde_json::json;
use std::sync::Arc;

fn cache() -> (Arc<MemoryStore>, Repository) {
    let store = Arc::new(MemoryStore::new());
    let repository = Repository::new(store.clone());
    (store, repository)
}

#[tokio::test]
async fn test_flush_invalidates_only_flushed_tag() {
    let (_, cache) = cache();

    cache.tags(["bop"]).unwrap().put("foo", "bar", 10).await.unwrap();
    cache.tags(["zap"]).unwrap().put("baz", "boom", 10).await.unwrap();

    assert_eq!(
        cache.tags(["bop"]).unwrap().get("foo").await.unwrap(),
        Some(json!("bar"))
    );

    cache.tags(["bop"]).unwrap().flush().await.unwrap();

    assert_eq!(cache.tags(["bop"]).unwrap().get("foo").await.unwrap(), None);
    assert_eq!(
        cache.tags(["zap"]).unwrap().get("baz").await.unwrap(),
        Some(json!("boom"))
    );
}

#[tokio::test]
async fn test_flush_leaves_backing_entry_in_place() {
    let (store, cache) = cache();
    let tagged = cache.tags(["bop"]).unwrap();
    tagged.put("foo", "bar", 10).await.unwrap();

    let tags = TagSet::new(store.clone(), vec!["bop".to_string()]);
    let physical = tagged_key(&tags.namespace().await.unwrap(), "foo");

    tagged.flush().await.unwrap();

    assert_eq!(tagged.get("foo").await.unwrap(), None);
    assert_eq!(store.get(&physical).await.unwrap(), Some(json!("bar")));
}

#[tokio::test]
async fn test_plain_flush_still_wipes_the_store() {
    let (_, cache) = cache();
    cache.put("plain", "value", 10).await.unwrap();
    cache.tags(["bop"]).unwrap().put("foo", "bar", 10).await.unwrap();

    cache.flush().await.unwrap();

    assert!(!cache.has("plain").await.unwrap());
    assert!(!cache.tags(["bop"]).unwrap().has("foo").await.unwrap());
}

#[tokio::test]
async fn test_multiple_tags_are_isolated() {
    let (_, cache) = cache();

    cache
        .tags(["thing1", "thing2"])
        .unwrap()
        .put("foo", "bar", 10)
        .await
        .unwrap();
    cache
        .tags(["thing3", "thing4"])
        .unwrap()
        .put("foo", "baz", 10)
        .await
        .unwrap();

    cache.tags(["thing1", "thing2"]).unwrap().flush().await.unwrap();

    assert_eq!(
        cache.tags(["thing1", "thing2"]).unwrap().get("foo").await.unwrap(),
        None
    );
    assert_eq!(
        cache.tags(["thing3", "thing4"]).unwrap().get("foo").await.unwrap(),
        Some(json!("baz"))
    );
}

#[tokio::test]
async fn test_partial_overlap_through_shared_tag() {
    let (_, cache) = cache();

    cache
        .tags(["thing1", "thing2"])
        .unwrap()
        .put("foo", "bar", 10)
        .await
        .unwrap();
    cache
        .tags(["thing3", "thing4"])
        .unwrap()
        .put("baz", "bam", 10)
        .await
        .unwrap();

    cache.tags(["thing2"]).unwrap().flush().await.unwrap();

    assert_eq!(
        cache.tags(["thing1", "thing2"]).unwrap().get("foo").await.unwrap(),
        None
    );
    assert_eq!(
        cache.tags(["thing3", "thing4"]).unwrap().get("baz").await.unwrap(),
        Some(json!("bam"))
    );
}

#[tokio::test]
async fn test_tag_order_changes_the_namespace() {
    let (_, cache) = cache();

    cache
        .tags(["bop", "zap"])
        .unwrap()
        .put("foo", "bar", 10)
        .await
        .unwrap();

    assert_eq!(
        cache.tags(["zap", "bop"]).unwrap().get("foo").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_tagged_key_is_deterministic_for_fixed_versions() {
    let (store, cache) = cache();
    store.forever("tag:bop:key", json!("a".repeat(32))).await.unwrap();
    store.forever("tag:zap:key", json!("b".repeat(32))).await.unwrap();

    cache
        .tags(["bop", "zap"])
        .unwrap()
        .put("foo", "bar", 10)
        .await
        .unwrap();

    let namespace = format!("{}|{}", "a".repeat(32), "b".repeat(32));
    let expected = format!("{}:foo", sha1_hex(&namespace));
    assert_eq!(tagged_key(&namespace, "foo"), expected);
    assert_eq!(store.get(&expected).await.unwrap(), Some(json!("bar")));
}

#[tokio::test]
async fn test_reset_twice_yields_distinct_versions() {
    let (store, cache) = cache();
    let tags = TagSet::new(store.clone(), vec!["bop".to_string()]);

    let tagged = cache.tags(["bop"]).unwrap();
    tagged.put("foo", "bar", 10).await.unwrap();

    let first = tags.reset("bop").await.unwrap();
    tagged.put("fresh", "value", 10).await.unwrap();
    let second = tags.reset("bop").await.unwrap();

    assert_ne!(first, second);
    assert_eq!(tagged.get("foo").await.unwrap(), None);
    assert_eq!(tagged.get("fresh").await.unwrap(), None);
}

#[tokio::test]
async fn test_tagged_put_with_absolute_expiry() {
    let (_, cache) = cache();
    let tagged = cache.tags(["bop"]).unwrap();

    tagged
        .put("future", "bar", Utc::now() + ChronoDuration::minutes(10))
        .await
        .unwrap();
    tagged
        .put("past", "bar", Utc::now() - ChronoDuration::minutes(10))
        .await
        .unwrap();

    assert_eq!(tagged.get("future").await.unwrap(), Some(json!("bar")));
    assert_eq!(tagged.get("past").await.unwrap(), None);
}

#[tokio::test]
async fn test_tags_cache_forever() {
    let (_, cache) = cache();

    cache
        .tags(["bop", "zap"])
        .unwrap()
        .forever("foo", "bar")
        .await
        .unwrap();
    assert_eq!(
        cache.tags(["bop", "zap"]).unwrap().get("foo").await.unwrap(),
        Some(json!("bar"))
    );

    cache.tags(["zap"]).unwrap().flush().await.unwrap();
    assert_eq!(
        cache.tags(["bop", "zap"]).unwrap().get("foo").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_tagged_conveniences() {
    let (_, cache) = cache();
    let tagged = cache.tags(["people"]).unwrap();

    assert_eq!(tagged.get_or("john", "nobody").await.unwrap(), json!("nobody"));
    assert!(tagged.add("john", "John", 10).await.unwrap());
    assert!(!tagged.add("john", "Johnny", 10).await.unwrap());

    let remembered = tagged
        .remember("jane", 10, || async { Ok("Jane") })
        .await
        .unwrap();
    assert_eq!(remembered, json!("Jane"));
    assert!(tagged.has("jane").await.unwrap());

    assert_eq!(tagged.increment("visits", 3).await.unwrap(), 3);
    assert!(tagged.forget("john").await.unwrap());
    assert!(!tagged.has("john").await.unwrap());
}

#[tokio::test]
async fn test_untaggable_store_reports_not_implemented() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Repository::new(Arc::new(FileStore::new(dir.path())));

    match cache.tags(["bop"]) {
        Err(CacheError::NotImplemented { store, operation }) => {
            assert_eq!(store, "file");
            assert_eq!(operation, "tags");
        }
        _ => panic!("file store should not be taggable"),
    }
}
