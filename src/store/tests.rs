//! Tests for checkpoint stores

use super::*;
use crate::config::StoreConfig;
use tempfile::tempdir;

// ============================================================================
// MemoryStore Tests
// ============================================================================

#[tokio::test]
async fn test_memory_get_set_delete() {
    let store = MemoryStore::new();

    assert!(store.get("messages").await.unwrap().is_none());

    store.set("messages", "{}".to_string()).await.unwrap();
    assert_eq!(store.get("messages").await.unwrap(), Some("{}".to_string()));

    store.delete("messages").await.unwrap();
    assert!(store.get("messages").await.unwrap().is_none());

    // Deleting again is fine
    store.delete("messages").await.unwrap();
}

#[tokio::test]
async fn test_memory_overwrite() {
    let store = MemoryStore::new();
    store.set("k", "one".to_string()).await.unwrap();
    store.set("k", "two".to_string()).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some("two".to_string()));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_memory_stats() {
    let store = MemoryStore::new();
    store.get("missing").await.unwrap();
    store.set("k", "v".to_string()).await.unwrap();
    store.get("k").await.unwrap();
    store.delete("k").await.unwrap();

    let stats = store.stats();
    assert_eq!(stats.gets, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.sets, 1);
    assert_eq!(stats.deletes, 1);
}

#[tokio::test]
async fn test_memory_clone_shares_entries() {
    let store = MemoryStore::new();
    let cloned = store.clone();

    store.set("users", "state".to_string()).await.unwrap();
    assert!(cloned.contains("users").await);
    assert_eq!(cloned.stats().sets, 1);
}

#[tokio::test]
async fn test_bounded_store_evicts_least_recently_used() {
    let store = MemoryStore::bounded(2);
    store.set("a", "1".to_string()).await.unwrap();
    store.set("b", "2".to_string()).await.unwrap();

    // Touch "a" so "b" becomes the eviction candidate
    store.get("a").await.unwrap();
    store.set("c", "3".to_string()).await.unwrap();

    assert_eq!(store.len().await, 2);
    assert!(store.contains("a").await);
    assert!(!store.contains("b").await);
    assert!(store.contains("c").await);
}

// ============================================================================
// FileStore Tests
// ============================================================================

#[tokio::test]
async fn test_file_get_set_delete() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state"));

    assert!(store.get("messages").await.unwrap().is_none());

    store
        .set("messages", r#"{"q": {}}"#.to_string())
        .await
        .unwrap();
    assert!(store.path_for("messages").exists());
    assert_eq!(
        store.get("messages").await.unwrap(),
        Some(r#"{"q": {}}"#.to_string())
    );

    store.delete("messages").await.unwrap();
    assert!(!store.path_for("messages").exists());
    store.delete("messages").await.unwrap();
}

#[tokio::test]
async fn test_file_keys_are_path_safe() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());

    store.set("../escape/kind", "v".to_string()).await.unwrap();
    let path = store.path_for("../escape/kind");
    assert_eq!(path.parent().unwrap(), dir.path());
    assert_eq!(
        store.get("../escape/kind").await.unwrap(),
        Some("v".to_string())
    );
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = tempdir().unwrap();

    FileStore::new(dir.path())
        .set("orders", "saved".to_string())
        .await
        .unwrap();

    let reopened = FileStore::new(dir.path());
    assert_eq!(
        reopened.get("orders").await.unwrap(),
        Some("saved".to_string())
    );
    assert_eq!(state_files(dir.path()), 1);
}

fn state_files(dir: &std::path::Path) -> usize {
    let names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().all(|name| name.ends_with(".json")), "{names:?}");
    names.len()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_concurrent_sets_last_writer_wins() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());

    for round in 0..20 {
        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .set("messages", format!("{round}:{writer}"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let value = store.get("messages").await.unwrap().unwrap();
        assert!(value.starts_with(&format!("{round}:")), "{value}");
    }

    assert_eq!(state_files(dir.path()), 1);
}

// ============================================================================
// Factory Tests
// ============================================================================

#[tokio::test]
async fn test_from_config_builds_working_stores() {
    let dir = tempdir().unwrap();

    for config in [
        StoreConfig::memory(),
        StoreConfig::bounded(4),
        StoreConfig::file(dir.path()),
    ] {
        let store = from_config(&config);
        store.set("kind", "value".to_string()).await.unwrap();
        assert_eq!(store.get("kind").await.unwrap(), Some("value".to_string()));
        store.delete("kind").await.unwrap();
        assert!(store.get("kind").await.unwrap().is_none());
    }
}
