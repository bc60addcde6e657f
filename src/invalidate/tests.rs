//! Tests for write hooks and invalidation

use super::*;
use crate::config::PagerConfig;
use crate::error::{Error, Result};
use crate::paginator::Paginator;
use crate::query::Query;
use crate::source::MemoryCollection;
use crate::store::{CheckpointStore, MemoryStore};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

struct Named {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
    fail: bool,
}

#[async_trait]
impl WriteHook for Named {
    async fn on_write(&self, _event: &WriteEvent) -> Result<()> {
        self.log.lock().unwrap().push(self.name);
        if self.fail {
            return Err(Error::store(format!("{} failed", self.name)));
        }
        Ok(())
    }
}

fn named(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, fail: bool) -> Arc<Named> {
    Arc::new(Named {
        name,
        log: Arc::clone(log),
        fail,
    })
}

#[test]
fn test_event_kind_and_display() {
    let event = WriteEvent::updated("messages");
    assert_eq!(event.kind(), "messages");
    assert_eq!(event.to_string(), "messages updated");
    assert_eq!(WriteEvent::created("a").to_string(), "a created");
    assert_eq!(WriteEvent::deleted("b").to_string(), "b deleted");
}

#[tokio::test]
async fn test_hooks_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = WriteHooks::new();
    hooks.register(named("first", &log, false));
    hooks.register(named("second", &log, false));

    assert_eq!(hooks.len(), 2);
    hooks.notify(&WriteEvent::created("messages")).await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_hook_failure_stops_notification() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = WriteHooks::new();
    hooks.register(named("first", &log, true));
    hooks.register(named("second", &log, false));

    let result = hooks.notify(&WriteEvent::deleted("messages")).await;
    assert!(matches!(result, Err(Error::Store { .. })));
    assert_eq!(*log.lock().unwrap(), vec!["first"]);
}

#[tokio::test]
async fn test_empty_hooks_notify_ok() {
    let hooks = WriteHooks::default();
    assert!(hooks.is_empty());
    hooks.notify(&WriteEvent::created("messages")).await.unwrap();
}

#[tokio::test]
async fn test_invalidator_deletes_only_its_kind() {
    let store = MemoryStore::new();
    store.set("messages", "{}".to_string()).await.unwrap();
    store.set("orders", "{}".to_string()).await.unwrap();

    let invalidator = Invalidator::new(Arc::new(store.clone()));
    invalidator
        .on_write(&WriteEvent::updated("messages"))
        .await
        .unwrap();

    assert!(!store.contains("messages").await);
    assert!(store.contains("orders").await);
}

#[tokio::test]
async fn test_collection_write_clears_cached_pages() {
    let store = MemoryStore::new();
    let pager = Paginator::new(Arc::new(store.clone()), PagerConfig::default());
    let collection = MemoryCollection::with_records(
        "messages",
        (0..6).map(|i| json!({"n": i})).collect(),
    )
    .with_hook(Arc::new(pager.invalidator()));
    let source = collection.source(Query::new("messages")).unwrap();

    let before = pager.paginate(&source, 4, 1).await.unwrap();
    assert_eq!(before.total_records, 6);
    assert!(store.contains("messages").await);

    collection.insert(json!({"n": 6})).await.unwrap();
    assert!(!store.contains("messages").await);

    let after = pager.paginate(&source, 4, 2).await.unwrap();
    assert_eq!(after.total_records, 7);
    assert_eq!(after.objects.len(), 3);
}
