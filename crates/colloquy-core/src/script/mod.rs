//! Script graph domain module.
//!
//! A script is the immutable, versioned definition of a conversation: flows
//! of nodes, transitions between them, and the hooks run around each
//! transition. Scripts are built once through [`ScriptBuilder`], validated,
//! and shared read-only across all concurrent turns.
//!
//! # Module Structure
//!
//! - `label`: node identity (`Label`)
//! - this module: `Transition`, `Node`, `Flow`, `NodeOverlay`, `Script`,
//!   `ScriptBuilder`

mod label;

pub use label::Label;

use crate::condition::Condition;
use crate::destination::Destination;
use crate::error::{ColloquyError, Result};
use crate::hook::NamedHook;
use crate::response::ResponseGenerator;
use std::collections::HashMap;

/// A conditional edge from a node to a destination.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Where the transition leads.
    pub dest: Destination,
    /// Predicate deciding whether the transition is taken.
    pub condition: Condition,
    /// Higher priority is evaluated first; ties break by declaration order.
    pub priority: f64,
}

impl Transition {
    /// Creates a transition with the default priority of 0.
    pub fn new(dest: impl Into<Destination>, condition: Condition) -> Self {
        Self {
            dest: dest.into(),
            condition,
            priority: 0.0,
        }
    }

    /// Sets the transition priority.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }
}

/// An atomic conversation state: one response generator, outgoing
/// transitions, and hooks run around the transition.
#[derive(Debug, Clone)]
pub struct Node {
    /// Produces the node's outgoing message.
    pub response: ResponseGenerator,
    /// Outgoing transitions, in declaration order.
    pub transitions: Vec<Transition>,
    /// Hooks run before the next node is selected, in declaration order.
    pub pre_transition: Vec<NamedHook>,
    /// Hooks run before this node's response is produced, in declaration order.
    pub pre_response: Vec<NamedHook>,
}

impl Node {
    /// Creates a node with the given response generator and no transitions.
    pub fn new(response: impl Into<ResponseGenerator>) -> Self {
        Self {
            response: response.into(),
            transitions: Vec::new(),
            pre_transition: Vec::new(),
            pre_response: Vec::new(),
        }
    }

    /// Appends a transition.
    pub fn transition(mut self, dest: impl Into<Destination>, condition: Condition) -> Self {
        self.transitions.push(Transition::new(dest, condition));
        self
    }

    /// Appends a transition with an explicit priority.
    pub fn transition_with_priority(
        mut self,
        dest: impl Into<Destination>,
        condition: Condition,
        priority: f64,
    ) -> Self {
        self.transitions
            .push(Transition::new(dest, condition).with_priority(priority));
        self
    }

    /// Appends a pre-transition hook.
    pub fn pre_transition(mut self, hook: NamedHook) -> Self {
        self.pre_transition.push(hook);
        self
    }

    /// Appends a pre-response hook.
    pub fn pre_response(mut self, hook: NamedHook) -> Self {
        self.pre_response.push(hook);
        self
    }
}

/// A named grouping of nodes representing a sub-topic of conversation.
#[derive(Debug, Clone, Default)]
pub struct Flow {
    /// Nodes by name.
    pub nodes: HashMap<String, Node>,
}

/// Transitions and hooks implicitly appended to every node of the script.
///
/// Global transitions are evaluated after node-local ones on equal priority
/// (the actor's tie-break configuration can flip this).
#[derive(Debug, Clone, Default)]
pub struct NodeOverlay {
    /// Transitions appended to every node's own set.
    pub transitions: Vec<Transition>,
    /// Pre-transition hooks appended to every node's own set.
    pub pre_transition: Vec<NamedHook>,
    /// Pre-response hooks appended to every node's own set.
    pub pre_response: Vec<NamedHook>,
}

/// The immutable conversation graph.
///
/// Constructed once through [`ScriptBuilder`], then shared read-only
/// (typically behind an `Arc`) across all conversations and turns.
#[derive(Debug, Clone)]
pub struct Script {
    flows: HashMap<String, Flow>,
    global: NodeOverlay,
    start: Label,
    fallback: Label,
}

impl Script {
    /// Starts building a script with the two distinguished labels.
    ///
    /// `start` seeds a brand-new context; `fallback` is the destination used
    /// whenever no transition condition is satisfied.
    pub fn builder(start: Label, fallback: Label) -> ScriptBuilder {
        ScriptBuilder {
            flows: HashMap::new(),
            global: NodeOverlay::default(),
            start,
            fallback,
        }
    }

    /// Looks up a node by label.
    pub fn get_node(&self, label: &Label) -> Option<&Node> {
        self.flows.get(&label.flow)?.nodes.get(&label.node)
    }

    /// The label seeding a brand-new context.
    pub fn start(&self) -> &Label {
        &self.start
    }

    /// The destination used when no transition condition is satisfied.
    pub fn fallback(&self) -> &Label {
        &self.fallback
    }

    /// The global overlay appended to every node.
    pub fn global(&self) -> &NodeOverlay {
        &self.global
    }

    /// The flows of the script, by name.
    pub fn flows(&self) -> &HashMap<String, Flow> {
        &self.flows
    }
}

/// Builder for [`Script`], validating the graph at `build()`.
#[derive(Debug)]
pub struct ScriptBuilder {
    flows: HashMap<String, Flow>,
    global: NodeOverlay,
    start: Label,
    fallback: Label,
}

impl ScriptBuilder {
    /// Adds a node to a flow, creating the flow if needed.
    pub fn node(mut self, flow: impl Into<String>, name: impl Into<String>, node: Node) -> Self {
        self.flows
            .entry(flow.into())
            .or_default()
            .nodes
            .insert(name.into(), node);
        self
    }

    /// Appends a transition to the global overlay.
    pub fn global_transition(mut self, transition: Transition) -> Self {
        self.global.transitions.push(transition);
        self
    }

    /// Appends a pre-transition hook to the global overlay.
    pub fn global_pre_transition(mut self, hook: NamedHook) -> Self {
        self.global.pre_transition.push(hook);
        self
    }

    /// Appends a pre-response hook to the global overlay.
    pub fn global_pre_response(mut self, hook: NamedHook) -> Self {
        self.global.pre_response.push(hook);
        self
    }

    /// Validates the graph and produces the immutable script.
    ///
    /// # Errors
    ///
    /// Returns a `Script` error when:
    /// - a flow or node name is empty
    /// - the start or fallback label does not resolve to a node
    /// - a static transition destination does not resolve to a node
    pub fn build(self) -> Result<Script> {
        let script = Script {
            flows: self.flows,
            global: self.global,
            start: self.start,
            fallback: self.fallback,
        };

        for (flow_name, flow) in &script.flows {
            if flow_name.is_empty() {
                return Err(ColloquyError::script("flow name must not be empty"));
            }
            for node_name in flow.nodes.keys() {
                if node_name.is_empty() {
                    return Err(ColloquyError::script(format!(
                        "node name in flow '{flow_name}' must not be empty"
                    )));
                }
            }
        }

        if script.get_node(&script.start).is_none() {
            return Err(ColloquyError::script(format!(
                "start label '{}' does not resolve to a node",
                script.start
            )));
        }
        if script.get_node(&script.fallback).is_none() {
            return Err(ColloquyError::script(format!(
                "fallback label '{}' does not resolve to a node",
                script.fallback
            )));
        }

        for (flow_name, flow) in &script.flows {
            for (node_name, node) in &flow.nodes {
                for transition in &node.transitions {
                    if let Destination::Static(label) = &transition.dest {
                        if script.get_node(label).is_none() {
                            return Err(ColloquyError::script(format!(
                                "transition from '{flow_name}/{node_name}' targets \
                                 unknown node '{label}'"
                            )));
                        }
                    }
                }
            }
        }
        for transition in &script.global.transitions {
            if let Destination::Static(label) = &transition.dest {
                if script.get_node(label).is_none() {
                    return Err(ColloquyError::script(format!(
                        "global transition targets unknown node '{label}'"
                    )));
                }
            }
        }

        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_builder() -> ScriptBuilder {
        Script::builder(Label::new("main", "start"), Label::new("main", "fallback"))
            .node("main", "start", Node::new("hello"))
            .node("main", "fallback", Node::new("sorry?"))
    }

    #[test]
    fn test_build_minimal_script() {
        let script = minimal_builder().build().unwrap();
        assert!(script.get_node(&Label::new("main", "start")).is_some());
        assert_eq!(script.start().node, "start");
        assert_eq!(script.fallback().node, "fallback");
    }

    #[test]
    fn test_missing_start_label() {
        let err = Script::builder(Label::new("main", "nope"), Label::new("main", "fallback"))
            .node("main", "fallback", Node::new("sorry?"))
            .build()
            .unwrap_err();
        assert!(err.is_script());
    }

    #[test]
    fn test_dangling_static_destination() {
        let err = minimal_builder()
            .node(
                "main",
                "greet",
                Node::new("hi").transition(Label::new("main", "missing"), Condition::Always),
            )
            .build()
            .unwrap_err();
        assert!(err.is_script());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_dangling_global_destination() {
        let err = minimal_builder()
            .global_transition(Transition::new(
                Label::new("other", "nowhere"),
                Condition::Always,
            ))
            .build()
            .unwrap_err();
        assert!(err.is_script());
    }

    #[test]
    fn test_self_loop_is_valid() {
        let script = minimal_builder()
            .node(
                "main",
                "echo",
                Node::new("again").transition(Label::new("main", "echo"), Condition::Always),
            )
            .build()
            .unwrap();
        assert!(script.get_node(&Label::new("main", "echo")).is_some());
    }

    #[test]
    fn test_global_overlay_collected() {
        let script = minimal_builder()
            .global_transition(
                Transition::new(Label::new("main", "start"), Condition::exact_match("restart"))
                    .with_priority(10.0),
            )
            .global_pre_transition(NamedHook::new("noop", |_| Ok(())))
            .build()
            .unwrap();
        assert_eq!(script.global().transitions.len(), 1);
        assert_eq!(script.global().pre_transition.len(), 1);
    }
}
