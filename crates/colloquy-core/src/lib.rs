//! Domain layer for Colloquy, a turn-based dialogue flow engine.
//!
//! This crate contains the data model shared by the whole workspace:
//!
//! - [`Message`]: the immutable request/response value
//! - [`Context`]: the per-conversation record of turn-indexed history
//! - [`Script`]: the immutable conversation graph (flows, nodes, transitions)
//! - [`Condition`] / [`Destination`] / [`ResponseGenerator`] / [`NamedHook`]:
//!   the polymorphic callables attached to script nodes
//! - [`ContextStorage`]: the persistence boundary
//! - [`ColloquyError`]: the shared error type
//!
//! Execution (the service orchestrator, the actor, the pipeline) lives in
//! `colloquy-engine`; storage backends live in `colloquy-infrastructure`.

pub mod condition;
pub mod context;
pub mod destination;
pub mod error;
pub mod hook;
pub mod message;
pub mod response;
pub mod script;
pub mod status;
pub mod storage;

// Re-export the common types at the crate root
pub use condition::Condition;
pub use context::{Context, HistoryField, TurnScratch};
pub use destination::Destination;
pub use error::{ColloquyError, Result};
pub use hook::NamedHook;
pub use message::{Attachment, Message};
pub use response::ResponseGenerator;
pub use script::{Flow, Label, Node, NodeOverlay, Script, ScriptBuilder, Transition};
pub use status::ServiceStatus;
pub use storage::ContextStorage;
