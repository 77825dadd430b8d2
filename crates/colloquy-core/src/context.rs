//! Conversation context domain model.
//!
//! This module contains the core `Context` entity: the per-conversation
//! mutable record that accumulates the turn-indexed history of requests,
//! responses and visited labels.
//!
//! A `Context` is exclusively owned by the turn currently processing it;
//! the engine never shares one context between concurrent turns.

use crate::message::Message;
use crate::script::Label;
use crate::status::ServiceStatus;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Selects which turn-indexed history fields an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryField {
    /// The `requests` history.
    Requests,
    /// The `responses` history.
    Responses,
    /// The `labels` history.
    Labels,
}

impl HistoryField {
    /// All history fields, in declaration order.
    pub const ALL: [HistoryField; 3] = [Self::Requests, Self::Responses, Self::Labels];
}

/// Per-turn scratch state owned by the engine.
///
/// The pipeline resets this at the start of every turn; user code must not
/// rely on its contents across turns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnScratch {
    /// Execution status per orchestrator component, keyed by path name.
    pub service_status: HashMap<String, ServiceStatus>,
    /// The actor's working copy of the current label, present only while a
    /// turn is in flight.
    pub working_label: Option<Label>,
}

impl TurnScratch {
    /// Clears all scratch fields.
    pub fn reset(&mut self) {
        self.service_status.clear();
        self.working_label = None;
    }
}

/// Represents one end-user conversation in the engine's domain layer.
///
/// A context contains:
/// - Turn-indexed request, response and label histories
/// - A `misc` bag owned entirely by user hooks
/// - Per-turn scratch state owned by the engine (not persisted)
/// - Timestamps for creation and last update
///
/// Turn indices are strictly increasing and never renumbered. After each
/// successfully completed turn the latest entries of `requests`, `responses`
/// and `labels` share the same turn index. The start node is never recorded
/// in `labels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Unique conversation identifier (UUID format unless supplied).
    pub id: String,
    /// Timestamp when the context was created (RFC 3339 format).
    pub created_at: String,
    /// Timestamp when the context was last updated (RFC 3339 format).
    pub updated_at: String,
    /// Turn-index → incoming message.
    #[serde(default)]
    pub requests: BTreeMap<u64, Message>,
    /// Turn-index → outgoing message.
    #[serde(default)]
    pub responses: BTreeMap<u64, Message>,
    /// Turn-index → label transitioned to on that turn.
    #[serde(default)]
    pub labels: BTreeMap<u64, Label>,
    /// Open key-value bag for user hooks; never read or written by the engine.
    #[serde(default)]
    pub misc: HashMap<String, serde_json::Value>,
    /// Per-turn engine scratch; reset at the start of every turn.
    #[serde(skip)]
    pub scratch: TurnScratch,
}

impl Context {
    /// Creates a new context with a generated UUID.
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    /// Creates a new context with the given identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            created_at: now.clone(),
            updated_at: now,
            requests: BTreeMap::new(),
            responses: BTreeMap::new(),
            labels: BTreeMap::new(),
            misc: HashMap::new(),
            scratch: TurnScratch::default(),
        }
    }

    /// The turn index the next turn will use (one past the highest recorded).
    ///
    /// Turn indices start at 1.
    pub fn next_turn_index(&self) -> u64 {
        let last = [
            self.requests.keys().next_back(),
            self.responses.keys().next_back(),
            self.labels.keys().next_back(),
        ]
        .into_iter()
        .flatten()
        .max()
        .copied()
        .unwrap_or(0);
        last + 1
    }

    /// The turn index of the turn currently in flight (the latest request).
    ///
    /// Returns 0 when no request has been recorded yet.
    pub fn current_turn_index(&self) -> u64 {
        self.requests.keys().next_back().copied().unwrap_or(0)
    }

    /// Number of completed turns (responses recorded).
    pub fn turn_count(&self) -> usize {
        self.responses.len()
    }

    /// Records the incoming message for a turn.
    pub fn add_request(&mut self, turn: u64, message: Message) {
        self.requests.insert(turn, message);
    }

    /// Records the outgoing message for a turn.
    pub fn add_response(&mut self, turn: u64, message: Message) {
        self.responses.insert(turn, message);
    }

    /// Records the label transitioned to on a turn.
    pub fn add_label(&mut self, turn: u64, label: Label) {
        self.labels.insert(turn, label);
    }

    /// The latest recorded request, if any.
    pub fn last_request(&self) -> Option<&Message> {
        self.requests.values().next_back()
    }

    /// The latest recorded response, if any.
    pub fn last_response(&self) -> Option<&Message> {
        self.responses.values().next_back()
    }

    /// The latest recorded label, if any.
    pub fn last_label(&self) -> Option<&Label> {
        self.labels.values().next_back()
    }

    /// The label recorded before the latest one, if any.
    pub fn previous_label(&self) -> Option<&Label> {
        self.labels.values().rev().nth(1)
    }

    /// Updates the `updated_at` timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Trims history in place, keeping only the last `keep_last` turns of the
    /// selected fields.
    ///
    /// Idempotent: trimming twice with the same arguments yields the same
    /// history as trimming once. `keep_last == 0` empties the selected
    /// fields entirely.
    pub fn clear(&mut self, keep_last: usize, fields: &[HistoryField]) {
        for field in fields {
            match field {
                HistoryField::Requests => trim(&mut self.requests, keep_last),
                HistoryField::Responses => trim(&mut self.responses, keep_last),
                HistoryField::Labels => trim(&mut self.labels, keep_last),
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn trim<T>(map: &mut BTreeMap<u64, T>, keep_last: usize) {
    while map.len() > keep_last {
        map.pop_first();
    }
}
