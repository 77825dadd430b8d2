//! Execution layer for Colloquy.
//!
//! This crate contains:
//! - The task orchestrator: [`Service`] / [`ServiceGroup`] trees executed
//!   against a shared context with ordering, optional concurrency, start
//!   conditions, timeouts, and failure isolation
//! - The [`Actor`]: the turn state machine advancing a context by exactly
//!   one turn per incoming message
//! - The [`Pipeline`]: the composition root exposing
//!   `process_turn(context_id, message) -> message`
//! - The [`Messenger`] boundary for platform adapters
//!
//! This crate does NOT care about:
//! - How contexts are persisted (see `colloquy-infrastructure`)
//! - Which chat platform messages come from
//! - How scripts are authored (see `colloquy-core`)

pub mod actor;
pub mod group;
pub mod messenger;
pub mod pipeline;
pub mod service;

pub use actor::{Actor, TieBreak};
pub use group::{Component, ServiceGroup};
pub use messenger::{channel_messenger, ChannelMessenger, Messenger};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use service::{service_fn, FnHandler, Service, ServiceHandler, SharedContext, StartCondition};
