//! Messenger boundary.
//!
//! A messenger adapts a chat platform to the engine: it converts platform
//! events into `(context_id, Message)` pairs and sends responses back. The
//! engine only ever sees this trait; platform specifics stay outside.

use async_trait::async_trait;
use colloquy_core::{ColloquyError, Message, Result};
use tokio::sync::mpsc;

/// Channel buffer size for the in-process messenger.
const CHANNEL_BUFFER_SIZE: usize = 100;

/// Adapter between a chat platform and the pipeline.
#[async_trait]
pub trait Messenger: Send {
    /// The next inbound event, or `None` when the platform connection is
    /// closed and the serve loop should stop.
    async fn recv(&mut self) -> Option<(String, Message)>;

    /// Delivers an outgoing message for the given conversation.
    async fn send(&self, context_id: &str, message: Message) -> Result<()>;
}

/// An in-process messenger over bounded channels.
///
/// Useful for tests and for embedding the engine behind an existing event
/// loop: push `(context_id, message)` pairs into the request sender, read
/// responses from the response receiver.
pub struct ChannelMessenger {
    requests: mpsc::Receiver<(String, Message)>,
    responses: mpsc::Sender<(String, Message)>,
}

/// Creates a [`ChannelMessenger`] plus its application-side endpoints.
pub fn channel_messenger() -> (
    ChannelMessenger,
    mpsc::Sender<(String, Message)>,
    mpsc::Receiver<(String, Message)>,
) {
    let (request_tx, request_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let (response_tx, response_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    (
        ChannelMessenger {
            requests: request_rx,
            responses: response_tx,
        },
        request_tx,
        response_rx,
    )
}

#[async_trait]
impl Messenger for ChannelMessenger {
    async fn recv(&mut self) -> Option<(String, Message)> {
        self.requests.recv().await
    }

    async fn send(&self, context_id: &str, message: Message) -> Result<()> {
        self.responses
            .send((context_id.to_string(), message))
            .await
            .map_err(|_| ColloquyError::execution("response channel closed"))
    }
}
