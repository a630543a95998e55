//! Tests for the counter stores.

use std::sync::Arc;

use pattern_generator::{
    step_increment, CounterGet, CounterSet, CounterValue, GenerateOptions, GeneratorOptions,
    PatternGenerator,
};
use serde_json::json;
use tempfile::TempDir;

use crate::{FileStore, MemoryStore};

// ============================================================================
// MemoryStore Tests
// ============================================================================

#[tokio::test]
async fn test_memory_store_get_set() {
    let store = MemoryStore::new(5);
    assert_eq!(store.get_counter().await.unwrap(), json!(5));

    store
        .set_counter(&CounterValue::Text("AAA100".to_string()))
        .await
        .unwrap();
    assert_eq!(store.get_counter().await.unwrap(), json!("AAA100"));
}

#[tokio::test]
async fn test_memory_store_next_value() {
    let store = Arc::new(MemoryStore::new(1));
    let increment = step_increment(1);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        let increment = increment.clone();
        handles.push(tokio::spawn(async move {
            store.next_value(&increment).await.unwrap()
        }));
    }

    let mut seen = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap().as_number().unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(store.current().await, CounterValue::Number(11));
}

#[tokio::test]
async fn test_memory_store_rejects_unadvanceable_value() {
    let store = MemoryStore::new("plate");
    assert!(store.next_value(&step_increment(1)).await.is_err());
    assert_eq!(store.current().await, CounterValue::Text("plate".to_string()));
}

#[tokio::test]
async fn test_memory_store_shared_between_generators() {
    let store = Arc::new(MemoryStore::new(1));
    let options = || {
        GeneratorOptions::new()
            .with_seed(1)
            .with_counter_store(store.clone())
    };
    let mut a = PatternGenerator::new("A<+ddd>", options()).unwrap();
    let mut b = PatternGenerator::new("B<+ddd>", options()).unwrap();

    assert_eq!(a.generate(&GenerateOptions::new()).await.unwrap(), "A001");
    assert_eq!(b.generate(&GenerateOptions::new()).await.unwrap(), "B002");
    assert_eq!(a.generate(&GenerateOptions::new()).await.unwrap(), "A003");
}

// ============================================================================
// FileStore Tests
// ============================================================================

#[tokio::test]
async fn test_file_store_missing_file_returns_initial() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().join("serials.json"), 100);

    assert!(store.read().unwrap().is_none());
    assert_eq!(store.get_counter().await.unwrap(), json!(100));
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("serials.json");
    let store = FileStore::new(&path, 1);

    store.set_counter(&CounterValue::Number(42)).await.unwrap();
    assert_eq!(store.get_counter().await.unwrap(), json!(42));

    let stored = store.read().unwrap().unwrap();
    assert_eq!(stored.name, "serials");
    assert_eq!(stored.value, CounterValue::Number(42));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["value"], json!(42));
    assert!(raw["updated_at"].is_string());
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plates.json");

    {
        let store = Arc::new(FileStore::new(&path, 1).with_name("plates"));
        let options = GeneratorOptions::new().with_counter_store(store);
        let mut generator = PatternGenerator::new("P-<+dd>", options).unwrap();
        for _ in 0..3 {
            generator.generate(&GenerateOptions::new()).await.unwrap();
        }
    }

    let store = Arc::new(FileStore::new(&path, 1));
    let options = GeneratorOptions::new().with_counter_store(store);
    let mut generator = PatternGenerator::new("P-<+dd>", options).unwrap();
    assert_eq!(
        generator.generate(&GenerateOptions::new()).await.unwrap(),
        "P-04"
    );
}

#[tokio::test]
async fn test_file_store_invalid_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "not json").unwrap();

    let store = FileStore::new(&path, 1);
    assert!(store.get_counter().await.is_err());
}
