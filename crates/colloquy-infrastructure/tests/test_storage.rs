use colloquy_core::{Context, ContextStorage, HistoryField, Label, Message};
use colloquy_infrastructure::{InMemoryContextStorage, TomlContextStorage};
use tempfile::TempDir;

fn context_with_turns(id: &str, n: u64) -> Context {
    let mut ctx = Context::with_id(id);
    for turn in 1..=n {
        ctx.add_request(turn, Message::text(format!("req {turn}")));
        ctx.add_label(turn, Label::new("main", format!("node_{turn}")));
        ctx.add_response(turn, Message::text(format!("resp {turn}")));
    }
    ctx
}

#[tokio::test]
async fn test_toml_put_get_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let storage = TomlContextStorage::new(temp_dir.path()).unwrap();

    let ctx = context_with_turns("ctx-1", 3);
    storage.put(&ctx).await.expect("Should persist context");

    let loaded = storage
        .get("ctx-1")
        .await
        .expect("Should load context")
        .expect("Context should exist");
    assert_eq!(loaded.requests, ctx.requests);
    assert_eq!(loaded.responses, ctx.responses);
    assert_eq!(loaded.labels, ctx.labels);
    assert_eq!(loaded.id, "ctx-1");
}

#[tokio::test]
async fn test_toml_get_missing_returns_none() {
    let temp_dir = TempDir::new().unwrap();
    let storage = TomlContextStorage::new(temp_dir.path()).unwrap();
    assert!(storage.get("nope").await.unwrap().is_none());
    assert!(!storage.contains("nope").await.unwrap());
}

#[tokio::test]
async fn test_toml_contains_and_delete() {
    let temp_dir = TempDir::new().unwrap();
    let storage = TomlContextStorage::new(temp_dir.path()).unwrap();

    storage.put(&context_with_turns("ctx-1", 1)).await.unwrap();
    assert!(storage.contains("ctx-1").await.unwrap());

    storage.delete("ctx-1").await.unwrap();
    assert!(!storage.contains("ctx-1").await.unwrap());

    // Deleting a missing context is not an error
    storage.delete("ctx-1").await.unwrap();
}

#[tokio::test]
async fn test_toml_clear_trims_history() {
    let temp_dir = TempDir::new().unwrap();
    let storage = TomlContextStorage::new(temp_dir.path()).unwrap();

    storage.put(&context_with_turns("ctx-1", 5)).await.unwrap();
    storage
        .clear("ctx-1", 2, &HistoryField::ALL)
        .await
        .expect("Should trim history");

    let loaded = storage.get("ctx-1").await.unwrap().unwrap();
    assert_eq!(loaded.requests.len(), 2);
    assert_eq!(
        loaded.requests.keys().copied().collect::<Vec<_>>(),
        vec![4, 5]
    );
}

#[tokio::test]
async fn test_toml_clear_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let storage = TomlContextStorage::new(temp_dir.path()).unwrap();

    storage.put(&context_with_turns("ctx-1", 5)).await.unwrap();
    storage.clear("ctx-1", 2, &HistoryField::ALL).await.unwrap();
    let once = storage.get("ctx-1").await.unwrap().unwrap();

    storage.clear("ctx-1", 2, &HistoryField::ALL).await.unwrap();
    let twice = storage.get("ctx-1").await.unwrap().unwrap();

    assert_eq!(once.requests, twice.requests);
    assert_eq!(once.responses, twice.responses);
    assert_eq!(once.labels, twice.labels);
}

#[tokio::test]
async fn test_toml_clear_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let storage = TomlContextStorage::new(temp_dir.path()).unwrap();
    let err = storage
        .clear("nope", 2, &HistoryField::ALL)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_toml_misc_survives_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let storage = TomlContextStorage::new(temp_dir.path()).unwrap();

    let mut ctx = context_with_turns("ctx-1", 1);
    ctx.misc
        .insert("slots".to_string(), serde_json::json!({ "city": "Paris" }));
    storage.put(&ctx).await.unwrap();

    let loaded = storage.get("ctx-1").await.unwrap().unwrap();
    assert_eq!(
        loaded.misc.get("slots"),
        Some(&serde_json::json!({ "city": "Paris" }))
    );
}

#[tokio::test]
async fn test_memory_storage_roundtrip() {
    let storage = InMemoryContextStorage::new();
    let ctx = context_with_turns("ctx-1", 2);
    storage.put(&ctx).await.unwrap();

    assert!(storage.contains("ctx-1").await.unwrap());
    let loaded = storage.get("ctx-1").await.unwrap().unwrap();
    assert_eq!(loaded.requests, ctx.requests);

    storage.delete("ctx-1").await.unwrap();
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_memory_storage_clear() {
    let storage = InMemoryContextStorage::new();
    storage.put(&context_with_turns("ctx-1", 4)).await.unwrap();

    storage
        .clear("ctx-1", 1, &[HistoryField::Requests])
        .await
        .unwrap();
    let loaded = storage.get("ctx-1").await.unwrap().unwrap();
    assert_eq!(loaded.requests.len(), 1);
    assert_eq!(loaded.responses.len(), 4);

    let err = storage
        .clear("missing", 1, &HistoryField::ALL)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
