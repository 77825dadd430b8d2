//! The actor turn state machine.
//!
//! The actor is the single service that deterministically advances a context
//! by exactly one turn: it resolves the current node, runs pre-transition
//! hooks, selects the next node by evaluating transition conditions in
//! priority order, runs pre-response hooks, produces the response, and
//! commits the new turn data into the context.

use crate::service::{ServiceHandler, SharedContext};
use async_trait::async_trait;
use colloquy_core::{
    ColloquyError, Condition, Context, Label, Node, Result, Script, Transition,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Precedence between node-local and global transitions when priorities are
/// numerically equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Node-local transitions win equal-priority ties (the default).
    #[default]
    NodeFirst,
    /// Global transitions win equal-priority ties.
    GlobalFirst,
}

/// Advances a context by one turn against an immutable script.
///
/// Installed in the pipeline as a turn-fatal service; the pipeline aborts
/// the turn if the actor fails (which only happens when even the fallback
/// response cannot be produced).
pub struct Actor {
    script: Arc<Script>,
    tie_break: TieBreak,
}

impl Actor {
    /// Creates an actor for the given script.
    pub fn new(script: Arc<Script>) -> Self {
        Self {
            script,
            tie_break: TieBreak::default(),
        }
    }

    /// Sets the node-local vs global equal-priority precedence.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// The script this actor executes.
    pub fn script(&self) -> &Arc<Script> {
        &self.script
    }

    /// Runs one full turn against the context.
    ///
    /// The incoming request for the turn must already be recorded; on
    /// success the destination label and the response are committed under
    /// the same turn index.
    pub fn advance(&self, ctx: &mut Context) -> Result<()> {
        let turn = ctx.current_turn_index();

        // Stage 1: resolve the current node.
        let current = self.resolve_current(ctx);
        ctx.scratch.working_label = Some(current.clone());
        let node = self
            .script
            .get_node(&current)
            .ok_or_else(|| ColloquyError::internal(format!("current node '{current}' vanished")))?;

        // Stage 2: pre-transition hooks, node-local then global, best-effort.
        for hook in node
            .pre_transition
            .iter()
            .chain(self.script.global().pre_transition.iter())
        {
            if let Err(e) = hook.run(ctx) {
                warn!(hook = %hook.name, error = %e, "pre-transition hook failed");
            }
        }

        // Stage 3: select the next node.
        let dest = self.select_destination(ctx, &current);
        debug!(turn, from = %current, to = %dest, "transition selected");

        // Stage 4: commit the label.
        ctx.add_label(turn, dest.clone());

        // Stage 5: pre-response hooks of the destination node.
        let dest_node = self
            .script
            .get_node(&dest)
            .ok_or_else(|| ColloquyError::internal(format!("destination '{dest}' vanished")))?;
        for hook in dest_node
            .pre_response
            .iter()
            .chain(self.script.global().pre_response.iter())
        {
            if let Err(e) = hook.run(ctx) {
                warn!(hook = %hook.name, error = %e, "pre-response hook failed");
            }
        }

        // Stage 6: produce the response, substituting the fallback node's
        // generator if the primary one fails.
        let response = match dest_node.response.generate(ctx) {
            Ok(message) => message,
            Err(e) => {
                warn!(node = %dest, error = %e, "response generation failed, using fallback");
                let fallback_node = self.fallback_node()?;
                fallback_node
                    .response
                    .generate(ctx)
                    .map_err(|e| ColloquyError::fallback(e.to_string()))?
            }
        };

        // Stage 7: commit the response.
        ctx.add_response(turn, response);
        ctx.touch();

        // Stage 8: drop the working label; the pipeline resets the rest of
        // the scratch at the start of the next turn.
        ctx.scratch.working_label = None;

        Ok(())
    }

    /// Stage 1: the last visited label, or the start label for a brand-new
    /// context. A stale label whose node no longer exists in the script
    /// resolves to the fallback label.
    fn resolve_current(&self, ctx: &Context) -> Label {
        match ctx.last_label() {
            Some(label) if self.script.get_node(label).is_some() => label.clone(),
            Some(label) => {
                warn!(label = %label, "last label not in script, falling back");
                self.script.fallback().clone()
            }
            None => self.script.start().clone(),
        }
    }

    /// Stage 3: evaluates transitions in descending priority order (source
    /// rank per the tie-break configuration, then declaration order) and
    /// returns the first satisfied transition's resolved destination, or the
    /// fallback label when none is satisfied.
    fn select_destination(&self, ctx: &Context, current: &Label) -> Label {
        let node = match self.script.get_node(current) {
            Some(node) => node,
            None => return self.script.fallback().clone(),
        };

        let (local_rank, global_rank) = match self.tie_break {
            TieBreak::NodeFirst => (0u8, 1u8),
            TieBreak::GlobalFirst => (1u8, 0u8),
        };

        let mut candidates: Vec<(f64, u8, usize, &Transition)> = Vec::new();
        for (index, transition) in node.transitions.iter().enumerate() {
            candidates.push((transition.priority, local_rank, index, transition));
        }
        for (index, transition) in self.script.global().transitions.iter().enumerate() {
            candidates.push((transition.priority, global_rank, index, transition));
        }
        candidates.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        for (_, _, _, transition) in &candidates {
            if !self.condition_satisfied(&transition.condition, ctx) {
                continue;
            }
            match transition.dest.resolve(ctx, &self.script, current) {
                Ok(label) => {
                    if self.script.get_node(&label).is_some() {
                        return label;
                    }
                    warn!(label = %label, "transition destination not in script, skipping");
                }
                Err(e) => {
                    warn!(error = %e, "destination resolution failed, skipping");
                }
            }
        }

        self.script.fallback().clone()
    }

    /// A condition error counts as "not satisfied".
    fn condition_satisfied(&self, condition: &Condition, ctx: &Context) -> bool {
        match condition.check(ctx) {
            Ok(satisfied) => satisfied,
            Err(e) => {
                warn!(error = %e, "condition evaluation failed, treating as false");
                false
            }
        }
    }

    fn fallback_node(&self) -> Result<&Node> {
        self.script.get_node(self.script.fallback()).ok_or_else(|| {
            ColloquyError::internal(format!(
                "fallback node '{}' vanished",
                self.script.fallback()
            ))
        })
    }
}

#[async_trait]
impl ServiceHandler for Actor {
    async fn handle(&self, ctx: &SharedContext) -> Result<()> {
        let mut guard = ctx.write().await;
        self.advance(&mut guard)
    }
}
