//! Named processing hooks.
//!
//! Hooks run around a transition: pre-transition hooks before the next node
//! is selected, pre-response hooks before the destination node's response is
//! produced. A hook failure is logged by the actor and never aborts the turn.

use crate::context::Context;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Signature of a hook closure.
pub type HookFn = Arc<dyn Fn(&mut Context) -> Result<()> + Send + Sync>;

/// A named hook attached to a node (or to the global overlay).
///
/// The name identifies the hook in logs when it fails.
#[derive(Clone)]
pub struct NamedHook {
    /// Hook name, used in logs.
    pub name: String,
    func: HookFn,
}

impl NamedHook {
    /// Creates a named hook from a closure.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Context) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Runs the hook against the context.
    pub fn run(&self, ctx: &mut Context) -> Result<()> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for NamedHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedHook")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
