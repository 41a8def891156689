//! Tests for the in-memory long-term store

mod common;

use aide_core::memory::{infer_category, InMemoryStore, MemoryCategory, MemoryRecord, MemoryStore};
use common::{FailingEmbedder, TableEmbedder};
use std::sync::Arc;

#[tokio::test]
async fn embeddings_rank_semantically() {
    let embedder = Arc::new(
        TableEmbedder::new(vec![0.0, 0.0, 1.0])
            .with("My project is called Alpha", vec![1.0, 0.0, 0.0])
            .with("I like green tea", vec![0.0, 1.0, 0.0])
            .with("what am I working on", vec![0.9, 0.1, 0.0]),
    );
    let store = InMemoryStore::with_embedder(embedder);
    store
        .insert(MemoryRecord::new("I like green tea", MemoryCategory::Preference))
        .await
        .unwrap();
    store
        .insert(MemoryRecord::new("My project is called Alpha", MemoryCategory::Fact))
        .await
        .unwrap();

    let hits = store.query("what am I working on", 1, None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "My project is called Alpha");
    assert!(!hits[0].embedding.is_empty());
}

#[tokio::test]
async fn embedder_outage_falls_back_to_lexical_ranking() {
    let store = InMemoryStore::with_embedder(Arc::new(FailingEmbedder::unavailable()));
    let id = store
        .insert(MemoryRecord::new("My project is called Alpha", MemoryCategory::Fact))
        .await
        .unwrap();

    let hits = store.query("project alpha", 3, None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id);
    assert!(hits[0].embedding.is_empty());
}

#[tokio::test]
async fn unavailable_embedder_is_called_once_per_session() {
    let embedder = Arc::new(FailingEmbedder::unavailable());
    let store = InMemoryStore::with_embedder(embedder.clone());

    for i in 0..5 {
        store
            .insert(MemoryRecord::new(format!("note {}", i), MemoryCategory::Fact))
            .await
            .unwrap();
        store.query("note", 3, None).await.unwrap();
    }

    assert_eq!(embedder.count(), 1);
    assert!(store.is_degraded());
}

#[tokio::test]
async fn malformed_embeddings_do_not_disable_the_embedder() {
    let embedder = Arc::new(FailingEmbedder::malformed());
    let store = InMemoryStore::with_embedder(embedder.clone());

    store.query("first", 3, None).await.unwrap();
    store.query("second", 3, None).await.unwrap();

    assert_eq!(embedder.count(), 2);
    assert!(!store.is_degraded());
}

#[tokio::test]
async fn unrelated_queries_return_nothing_lexically() {
    let store = InMemoryStore::new();
    store
        .insert(MemoryRecord::new("My project is called Alpha", MemoryCategory::Fact))
        .await
        .unwrap();

    assert!(store.query("weather tomorrow", 3, None).await.unwrap().is_empty());
    assert!(store.query("project", 0, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn records_get_unique_ids() {
    let store = InMemoryStore::new();
    let a = store
        .insert(MemoryRecord::new("first", MemoryCategory::Fact))
        .await
        .unwrap();
    let b = store
        .insert(MemoryRecord::conversation("hello there friend", "Hi!"))
        .await
        .unwrap();

    assert_ne!(a, b);
    let records = store.records();
    assert_eq!(records.len(), 2);
    let convo = records
        .iter()
        .find(|r| r.category == MemoryCategory::Conversation)
        .unwrap();
    assert!(convo.text.starts_with("User: hello there friend"));
    assert_eq!(store.count().await.unwrap(), 2);
}

#[test]
fn category_inference() {
    assert_eq!(infer_category("I prefer dark mode"), MemoryCategory::Preference);
    assert_eq!(infer_category("My favorite food is pasta"), MemoryCategory::Preference);
    assert_eq!(infer_category("My id is 42"), MemoryCategory::Fact);
}
