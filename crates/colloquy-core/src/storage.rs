//! Context storage trait.
//!
//! Defines the interface for context persistence operations.

use crate::context::{Context, HistoryField};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract key/value store for conversation contexts.
///
/// This trait defines the contract for persisting and retrieving contexts,
/// decoupling the engine from the specific storage mechanism (in-memory map,
/// TOML files, database, remote API).
///
/// # Implementation Notes
///
/// The engine serializes access per context: a context fetched for a turn is
/// exclusively owned by that turn until it is put back. Implementations do
/// not need per-context locking for the engine's own access pattern, but may
/// add it for external callers.
#[async_trait]
pub trait ContextStorage: Send + Sync {
    /// Fetches a context by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Context))`: context found
    /// - `Ok(None)`: context not found
    /// - `Err(_)`: the backend failed
    async fn get(&self, context_id: &str) -> Result<Option<Context>>;

    /// Persists a context under its own ID.
    async fn put(&self, context: &Context) -> Result<()>;

    /// Whether a context with the given ID is stored.
    async fn contains(&self, context_id: &str) -> Result<bool>;

    /// Deletes a context. Deleting a missing context is not an error.
    async fn delete(&self, context_id: &str) -> Result<()>;

    /// Trims a stored context's history in place, keeping only the last
    /// `keep_last` turns of the selected fields.
    ///
    /// Idempotent: calling twice with the same arguments yields the same
    /// truncated history as calling once.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no context is stored under `context_id`.
    async fn clear(
        &self,
        context_id: &str,
        keep_last: usize,
        fields: &[HistoryField],
    ) -> Result<()>;
}
