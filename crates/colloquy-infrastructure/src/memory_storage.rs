//! In-memory ContextStorage implementation.

use async_trait::async_trait;
use colloquy_core::{Context, ContextStorage, HistoryField};
use colloquy_core::error::{ColloquyError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A storage backend keeping all contexts in a process-local map.
///
/// Intended for tests and single-process deployments where persistence
/// across restarts is not needed.
#[derive(Default)]
pub struct InMemoryContextStorage {
    contexts: RwLock<HashMap<String, Context>>,
}

impl InMemoryContextStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored contexts.
    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    /// Whether the storage is empty.
    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }
}

#[async_trait]
impl ContextStorage for InMemoryContextStorage {
    async fn get(&self, context_id: &str) -> Result<Option<Context>> {
        let contexts = self.contexts.read().await;
        Ok(contexts.get(context_id).cloned())
    }

    async fn put(&self, context: &Context) -> Result<()> {
        let mut contexts = self.contexts.write().await;
        contexts.insert(context.id.clone(), context.clone());
        Ok(())
    }

    async fn contains(&self, context_id: &str) -> Result<bool> {
        let contexts = self.contexts.read().await;
        Ok(contexts.contains_key(context_id))
    }

    async fn delete(&self, context_id: &str) -> Result<()> {
        let mut contexts = self.contexts.write().await;
        contexts.remove(context_id);
        Ok(())
    }

    async fn clear(
        &self,
        context_id: &str,
        keep_last: usize,
        fields: &[HistoryField],
    ) -> Result<()> {
        let mut contexts = self.contexts.write().await;
        let context = contexts
            .get_mut(context_id)
            .ok_or_else(|| ColloquyError::not_found("context", context_id))?;
        context.clear(keep_last, fields);
        Ok(())
    }
}
