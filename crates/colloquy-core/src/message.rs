//! Conversation message types.
//!
//! This module contains types for representing messages exchanged during a
//! conversation, used both for incoming requests and outgoing responses.

use serde::{Deserialize, Serialize};

/// A media attachment carried alongside message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// An image, referenced by URL.
    Image { url: String },
    /// An audio clip, referenced by URL.
    Audio { url: String },
    /// An arbitrary document, referenced by URL.
    Document { url: String },
    /// A geographic location.
    Location { latitude: f64, longitude: f64 },
}

/// A single message in a conversation.
///
/// A message is an immutable value: text, optional structured attachments,
/// and an optional command/UI payload that the core never inspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Message {
    /// The textual content of the message.
    pub text: String,
    /// Structured attachments (images, documents, locations, etc.).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Platform command or UI payload, opaque to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<serde_json::Value>,
}

impl Message {
    /// Creates a plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attaches a media item to the message.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Sets the command/UI payload.
    pub fn with_command(mut self, command: serde_json::Value) -> Self {
        self.command = Some(command);
        self
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}
