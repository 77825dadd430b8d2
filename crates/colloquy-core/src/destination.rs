//! Transition destinations.
//!
//! A destination names where a transition leads. Besides static labels, a
//! handful of positional destinations are resolved from the context at
//! evaluation time, and `Dynamic` wraps an arbitrary resolver closure.

use crate::context::Context;
use crate::error::Result;
use crate::script::{Label, Script};
use std::fmt;
use std::sync::Arc;

/// Signature of a dynamic destination resolver.
pub type DestinationFn = Arc<dyn Fn(&Context) -> Result<Label> + Send + Sync>;

/// Where a transition leads, possibly resolved from the context.
#[derive(Clone)]
pub enum Destination {
    /// A fixed label.
    Static(Label),
    /// The current node (a self-loop).
    Current,
    /// The node visited on the turn before the current one; resolves to the
    /// start label when there is no earlier turn.
    Previous,
    /// The script's start label.
    Start,
    /// The script's fallback label.
    Fallback,
    /// A label computed from the context at evaluation time.
    Dynamic(DestinationFn),
}

impl Destination {
    /// Shorthand for [`Destination::Static`].
    pub fn label(flow: impl Into<String>, node: impl Into<String>) -> Self {
        Self::Static(Label::new(flow, node))
    }

    /// Wraps a resolver closure.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<Label> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Resolves the destination to a concrete label.
    ///
    /// `current` is the actor's working label for the turn.
    ///
    /// # Errors
    ///
    /// Propagates errors from `Dynamic` resolvers.
    pub fn resolve(&self, ctx: &Context, script: &Script, current: &Label) -> Result<Label> {
        match self {
            Self::Static(label) => Ok(label.clone()),
            Self::Current => Ok(current.clone()),
            Self::Previous => Ok(ctx
                .previous_label()
                .cloned()
                .unwrap_or_else(|| script.start().clone())),
            Self::Start => Ok(script.start().clone()),
            Self::Fallback => Ok(script.fallback().clone()),
            Self::Dynamic(f) => f(ctx),
        }
    }
}

impl From<Label> for Destination {
    fn from(label: Label) -> Self {
        Self::Static(label)
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(label) => f.debug_tuple("Static").field(label).finish(),
            Self::Current => write!(f, "Current"),
            Self::Previous => write!(f, "Previous"),
            Self::Start => write!(f, "Start"),
            Self::Fallback => write!(f, "Fallback"),
            Self::Dynamic(_) => write!(f, "Dynamic(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::response::ResponseGenerator;
    use crate::script::Node;

    fn test_script() -> Script {
        Script::builder(Label::new("main", "start"), Label::new("main", "fallback"))
            .node("main", "start", Node::new(ResponseGenerator::text("start")))
            .node("main", "fallback", Node::new(ResponseGenerator::text("fallback")))
            .node("main", "a", Node::new(ResponseGenerator::text("a")))
            .node("main", "b", Node::new(ResponseGenerator::text("b")))
            .build()
            .unwrap()
    }

    fn context_with_labels(nodes: &[&str]) -> Context {
        let mut ctx = Context::with_id("test");
        for (i, node) in nodes.iter().enumerate() {
            let turn = (i + 1) as u64;
            ctx.add_request(turn, Message::text("x"));
            ctx.add_label(turn, Label::new("main", *node));
            ctx.add_response(turn, Message::text("y"));
        }
        ctx
    }

    #[test]
    fn test_static_and_positional() {
        let script = test_script();
        let ctx = context_with_labels(&["a", "b"]);
        let current = Label::new("main", "b");

        let dest = Destination::label("main", "a");
        assert_eq!(dest.resolve(&ctx, &script, &current).unwrap().node, "a");
        assert_eq!(
            Destination::Current
                .resolve(&ctx, &script, &current)
                .unwrap()
                .node,
            "b"
        );
        assert_eq!(
            Destination::Previous
                .resolve(&ctx, &script, &current)
                .unwrap()
                .node,
            "a"
        );
        assert_eq!(
            Destination::Start
                .resolve(&ctx, &script, &current)
                .unwrap()
                .node,
            "start"
        );
        assert_eq!(
            Destination::Fallback
                .resolve(&ctx, &script, &current)
                .unwrap()
                .node,
            "fallback"
        );
    }

    #[test]
    fn test_previous_defaults_to_start() {
        let script = test_script();
        let ctx = context_with_labels(&["a"]);
        let current = Label::new("main", "a");
        assert_eq!(
            Destination::Previous
                .resolve(&ctx, &script, &current)
                .unwrap()
                .node,
            "start"
        );
    }

    #[test]
    fn test_dynamic_resolver() {
        let script = test_script();
        let ctx = context_with_labels(&["a"]);
        let current = Label::new("main", "a");
        let dest = Destination::dynamic(|ctx| {
            let node = if ctx.turn_count() > 0 { "b" } else { "a" };
            Ok(Label::new("main", node))
        });
        assert_eq!(dest.resolve(&ctx, &script, &current).unwrap().node, "b");
    }
}
