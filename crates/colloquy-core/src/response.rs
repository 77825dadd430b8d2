//! Node response generators.

use crate::context::Context;
use crate::error::Result;
use crate::message::Message;
use std::fmt;
use std::sync::Arc;

/// Signature of a dynamic response closure.
pub type ResponseFn = Arc<dyn Fn(&Context) -> Result<Message> + Send + Sync>;

/// Produces a node's outgoing message: either a fixed value or a closure
/// computing one from the context.
#[derive(Clone)]
pub enum ResponseGenerator {
    /// A fixed response, used as-is.
    Static(Message),
    /// A response computed from the context at generation time.
    Dynamic(ResponseFn),
}

impl ResponseGenerator {
    /// A fixed plain-text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Static(Message::text(text))
    }

    /// Wraps a closure producing the response from the context.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<Message> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Produces the response for the given context.
    pub fn generate(&self, ctx: &Context) -> Result<Message> {
        match self {
            Self::Static(message) => Ok(message.clone()),
            Self::Dynamic(f) => f(ctx),
        }
    }
}

impl From<Message> for ResponseGenerator {
    fn from(message: Message) -> Self {
        Self::Static(message)
    }
}

impl From<&str> for ResponseGenerator {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl fmt::Debug for ResponseGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(message) => f.debug_tuple("Static").field(message).finish(),
            Self::Dynamic(_) => write!(f, "Dynamic(..)"),
        }
    }
}
