//! Integration tests for the Redis store
//!
//! These tests require a running Redis server. Point `REDIS_URL` at a
//! database that may be flushed; the default uses database 15.
#![cfg(feature = "redis")]

use ouroboros_cache::{ListStore, RedisStore, Repository, Store, TagSet};
use serde_json::json;
use std::sync::Arc;

// Helper function to get the Redis URL from environment or use the default
fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/15".to_string())
}

// Each test gets its own prefix so tests can share a database
async fn connect() -> Arc<RedisStore> {
    let prefix = format!("test:{}:", uuid::Uuid::new_v4().simple());
    let store = RedisStore::connect_url(&get_redis_url(), prefix)
        .await
        .expect("Failed to connect to Redis");
    Arc::new(store)
}

#[tokio::test]
#[ignore] // Run with: cargo test --ignored
async fn test_put_get_forget() {
    let store = connect().await;

    store.put("foo", json!({"name": "bar"}), 10).await.unwrap();
    assert_eq!(store.get("foo").await.unwrap(), Some(json!({"name": "bar"})));

    assert!(store.forget("foo").await.unwrap());
    assert!(!store.forget("foo").await.unwrap());
    assert_eq!(store.get("foo").await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_counters() {
    let store = connect().await;

    store.forever("hits", json!(1)).await.unwrap();
    assert_eq!(store.increment("hits", 4).await.unwrap(), 5);
    assert_eq!(store.decrement("hits", 2).await.unwrap(), 3);
    assert_eq!(store.get("hits").await.unwrap(), Some(json!(3)));
}

#[tokio::test]
#[ignore]
async fn test_zero_minutes_still_expires() {
    let store = connect().await;
    store.put("short", json!("lived"), 0).await.unwrap();

    let mut conn = store.connection();
    let ttl: i64 = redis::cmd("TTL")
        .arg(format!("{}short", store.prefix()))
        .query_async(&mut conn)
        .await
        .unwrap();

    assert!(ttl > 0 && ttl <= 60);
}

#[tokio::test]
#[ignore]
async fn test_list_operations_use_raw_keys() {
    let store = connect().await;
    let list_key = format!("{}registry", store.prefix());

    store.list_push(&list_key, "first").await.unwrap();
    store.list_push(&list_key, "second").await.unwrap();

    assert_eq!(
        store.list_range(&list_key, 0, -1).await.unwrap(),
        vec!["second".to_string(), "first".to_string()]
    );
    assert_eq!(store.delete(&[list_key.clone()]).await.unwrap(), 1);
    assert!(store.list_range(&list_key, 0, -1).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_tagged_forever_is_deleted_on_flush() {
    let store = connect().await;
    let cache = Repository::new(store.clone());

    cache
        .tags(["bop", "zap"])
        .unwrap()
        .forever("foo", "bar")
        .await
        .unwrap();

    let backing: Arc<dyn Store> = store.clone();
    let namespace = TagSet::new(backing, vec!["bop".to_string(), "zap".to_string()])
        .namespace()
        .await
        .unwrap();
    let full_key = format!(
        "{}{}",
        store.prefix(),
        ouroboros_cache::tagged_key(&namespace, "foo")
    );
    let zap_list = format!("{}{}:forever", store.prefix(), namespace.split('|').nth(1).unwrap());

    assert_eq!(
        store.list_range(&zap_list, 0, -1).await.unwrap(),
        vec![full_key.clone()]
    );

    cache.tags(["zap"]).unwrap().flush().await.unwrap();

    assert_eq!(store.delete(&[full_key]).await.unwrap(), 0);
    assert!(store.list_range(&zap_list, 0, -1).await.unwrap().is_empty());
    assert_eq!(
        cache.tags(["bop", "zap"]).unwrap().get("foo").await.unwrap(),
        None
    );
}
