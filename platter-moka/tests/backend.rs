//! Backend contract tests for the Moka implementation.

use std::time::Duration;

use bytes::Bytes;
use platter_backend::{Backend, CacheBackend, DeleteStatus};
use platter_core::{CacheValue, Fingerprint};
use platter_moka::MokaBackend;

fn key(id: u32) -> Fingerprint {
    Fingerprint::of("test", 1, &id)
}

fn value(payload: &str) -> CacheValue<Bytes> {
    CacheValue::new(
        Bytes::copy_from_slice(payload.as_bytes()),
        Duration::from_secs(60),
        None,
    )
}

#[tokio::test]
async fn write_then_read_returns_entry() {
    let backend = MokaBackend::builder(100).build();
    backend.write(&key(1), value("hello"), None).await.unwrap();

    let read = backend.read(&key(1)).await.unwrap().unwrap();
    assert_eq!(read.data().as_ref(), b"hello");
}

#[tokio::test]
async fn read_of_unknown_key_is_none() {
    let backend = MokaBackend::builder(100).build();
    assert!(backend.read(&key(42)).await.unwrap().is_none());
}

#[tokio::test]
async fn remove_reports_whether_entry_existed() {
    let backend = MokaBackend::builder(100).build();
    backend.write(&key(7), value("x"), None).await.unwrap();

    assert_eq!(
        backend.remove(&key(7)).await.unwrap(),
        DeleteStatus::Deleted(1)
    );
    assert_eq!(backend.remove(&key(7)).await.unwrap(), DeleteStatus::Missing);
}

#[tokio::test]
async fn typed_roundtrip_preserves_creation_time() {
    let backend = MokaBackend::builder(100).build();
    let original = CacheValue::new(
        vec!["a".to_owned(), "b".to_owned()],
        Duration::from_secs(60),
        None,
    );
    let created = original.created_at();

    backend.set(&key(3), original).await.unwrap();
    let read: CacheValue<Vec<String>> = backend.get(&key(3)).await.unwrap().unwrap();

    assert_eq!(read.data(), &vec!["a".to_owned(), "b".to_owned()]);
    assert_eq!(read.created_at(), created);
}

#[tokio::test]
async fn capacity_bound_evicts_old_entries() {
    let backend = MokaBackend::builder(3).build();
    for i in 0..10u32 {
        backend.write(&key(i), value("v"), None).await.unwrap();
    }
    backend.cache().run_pending_tasks().await;

    let mut present = 0;
    for i in 0..10u32 {
        if backend.read(&key(i)).await.unwrap().is_some() {
            present += 1;
        }
    }
    assert!(present <= 3, "expected at most 3 entries, found {present}");
}
