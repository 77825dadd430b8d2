//! Persistence DTOs.
//!
//! The domain `Context` keeps its histories in `u64`-keyed maps; TOML
//! requires string table keys, so the persisted shape flattens each history
//! into a list of per-turn records. Conversions between the two shapes are
//! lossless (the engine-owned scratch state is intentionally not persisted).

use colloquy_core::{Context, Label, Message};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One turn's entry in a message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// The turn index.
    pub turn: u64,
    /// The message recorded for the turn.
    pub message: Message,
}

/// One turn's entry in the label history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// The turn index.
    pub turn: u64,
    /// Flow name of the node transitioned to.
    pub flow: String,
    /// Node name of the node transitioned to.
    pub node: String,
}

/// The persisted representation of a [`Context`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDto {
    /// Conversation identifier.
    pub id: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last-update timestamp (RFC 3339).
    pub updated_at: String,
    /// Request history, one record per turn.
    #[serde(default)]
    pub requests: Vec<MessageRecord>,
    /// Response history, one record per turn.
    #[serde(default)]
    pub responses: Vec<MessageRecord>,
    /// Label history, one record per turn.
    #[serde(default)]
    pub labels: Vec<LabelRecord>,
    /// The user-hook-owned bag.
    #[serde(default)]
    pub misc: HashMap<String, serde_json::Value>,
}

impl From<&Context> for ContextDto {
    fn from(ctx: &Context) -> Self {
        Self {
            id: ctx.id.clone(),
            created_at: ctx.created_at.clone(),
            updated_at: ctx.updated_at.clone(),
            requests: ctx
                .requests
                .iter()
                .map(|(&turn, message)| MessageRecord {
                    turn,
                    message: message.clone(),
                })
                .collect(),
            responses: ctx
                .responses
                .iter()
                .map(|(&turn, message)| MessageRecord {
                    turn,
                    message: message.clone(),
                })
                .collect(),
            labels: ctx
                .labels
                .iter()
                .map(|(&turn, label)| LabelRecord {
                    turn,
                    flow: label.flow.clone(),
                    node: label.node.clone(),
                })
                .collect(),
            misc: ctx.misc.clone(),
        }
    }
}

impl From<ContextDto> for Context {
    fn from(dto: ContextDto) -> Self {
        let mut ctx = Context::with_id(dto.id);
        ctx.created_at = dto.created_at;
        ctx.updated_at = dto.updated_at;
        for record in dto.requests {
            ctx.requests.insert(record.turn, record.message);
        }
        for record in dto.responses {
            ctx.responses.insert(record.turn, record.message);
        }
        for record in dto.labels {
            ctx.labels
                .insert(record.turn, Label::new(record.flow, record.node));
        }
        ctx.misc = dto.misc;
        ctx
    }
}
