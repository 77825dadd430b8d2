//! Pipeline composition root.
//!
//! The pipeline owns one script, one orchestrator tree with the actor as its
//! mandatory turn-fatal member, and a storage backend. It exposes a single
//! operation: process one turn for one conversation.

use crate::actor::{Actor, TieBreak};
use crate::group::{Component, ServiceGroup};
use crate::messenger::Messenger;
use crate::service::{Service, SharedContext};
use colloquy_core::{
    ColloquyError, Context, ContextStorage, Message, Result, Script, ServiceStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Name of the root orchestrator group.
const ROOT_GROUP: &str = "pipeline";
/// Name of the actor service inside the root group.
const ACTOR_SERVICE: &str = "actor";

/// The engine's composition root.
///
/// Concurrent calls for different context ids proceed independently;
/// serializing concurrent calls for the *same* id is the caller's
/// responsibility.
pub struct Pipeline {
    root: ServiceGroup,
    storage: Arc<dyn ContextStorage>,
}

impl Pipeline {
    /// Starts building a pipeline from a script and a storage backend.
    pub fn builder(script: Script, storage: Arc<dyn ContextStorage>) -> PipelineBuilder {
        PipelineBuilder {
            script: Arc::new(script),
            storage,
            pre: Vec::new(),
            post: Vec::new(),
            tie_break: TieBreak::default(),
        }
    }

    /// Processes one turn: fetches or creates the context, appends the
    /// request, runs the orchestrator tree, persists the context, and
    /// returns the response.
    pub async fn process_turn(&self, context_id: &str, request: Message) -> Result<Message> {
        let (response, _) = self.process_turn_with_report(context_id, request).await?;
        Ok(response)
    }

    /// Like [`process_turn`], additionally returning the per-component
    /// execution statuses recorded during the turn.
    ///
    /// [`process_turn`]: Pipeline::process_turn
    pub async fn process_turn_with_report(
        &self,
        context_id: &str,
        request: Message,
    ) -> Result<(Message, HashMap<String, ServiceStatus>)> {
        let mut ctx = match self.storage.get(context_id).await? {
            Some(ctx) => ctx,
            None => Context::with_id(context_id),
        };

        // The scratch contract: reset at the start of every turn.
        ctx.scratch.reset();
        let turn = ctx.next_turn_index();
        ctx.add_request(turn, request);
        debug!(context_id, turn, "processing turn");

        let shared: SharedContext = Arc::new(RwLock::new(ctx));
        let run_result = self.root.run(ROOT_GROUP.to_string(), &shared).await;
        let ctx = Arc::try_unwrap(shared)
            .map_err(|_| ColloquyError::internal("context still shared after turn"))?
            .into_inner();
        run_result?;

        let response = ctx
            .last_response()
            .cloned()
            .ok_or_else(|| ColloquyError::internal("turn produced no response"))?;
        let report = ctx.scratch.service_status.clone();

        self.storage.put(&ctx).await?;
        Ok((response, report))
    }

    /// Drives the pipeline from a messenger: drains inbound events, processes
    /// each turn, and forwards responses.
    ///
    /// Per-turn failures are logged and skipped so one broken conversation
    /// cannot stop the loop; the loop ends when the messenger's event stream
    /// ends.
    pub async fn serve<M: Messenger>(&self, mut messenger: M) -> Result<()> {
        while let Some((context_id, request)) = messenger.recv().await {
            match self.process_turn(&context_id, request).await {
                Ok(response) => {
                    if let Err(e) = messenger.send(&context_id, response).await {
                        error!(context_id, error = %e, "failed to deliver response");
                    }
                }
                Err(e) => {
                    error!(context_id, error = %e, "turn failed");
                }
            }
        }
        Ok(())
    }

    /// The storage backend this pipeline persists contexts to.
    pub fn storage(&self) -> &Arc<dyn ContextStorage> {
        &self.storage
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    script: Arc<Script>,
    storage: Arc<dyn ContextStorage>,
    pre: Vec<Component>,
    post: Vec<Component>,
    tie_break: TieBreak,
}

impl PipelineBuilder {
    /// Appends a component executed before the actor each turn.
    pub fn pre_service(mut self, component: impl Into<Component>) -> Self {
        self.pre.push(component.into());
        self
    }

    /// Appends a component executed after the actor each turn.
    pub fn post_service(mut self, component: impl Into<Component>) -> Self {
        self.post.push(component.into());
        self
    }

    /// Sets the actor's node-local vs global equal-priority precedence.
    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Assembles and validates the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an `Execution` error when sibling component names collide.
    pub fn build(self) -> Result<Pipeline> {
        let actor = Actor::new(self.script).with_tie_break(self.tie_break);
        let mut root = ServiceGroup::new().named(ROOT_GROUP);
        for component in self.pre {
            root = root.component(component);
        }
        root = root.service(Service::new(actor).named(ACTOR_SERVICE).fatal(true));
        for component in self.post {
            root = root.component(component);
        }
        root.validate()?;

        Ok(Pipeline {
            root,
            storage: self.storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{service_fn, SharedContext};
    use colloquy_core::{Condition, Label, Node};
    use colloquy_infrastructure::InMemoryContextStorage;

    fn echo_script() -> Script {
        Script::builder(Label::new("main", "start"), Label::new("main", "fallback"))
            .node(
                "main",
                "start",
                Node::new("welcome").transition(Label::new("main", "echo"), Condition::Always),
            )
            .node(
                "main",
                "echo",
                Node::new(colloquy_core::ResponseGenerator::dynamic(|ctx| {
                    let text = ctx.last_request().map(|m| m.text.clone()).unwrap_or_default();
                    Ok(Message::text(format!("echo: {text}")))
                }))
                .transition(Label::new("main", "echo"), Condition::Always),
            )
            .node("main", "fallback", Node::new("sorry?"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_process_turn_appends_and_persists() {
        let storage = Arc::new(InMemoryContextStorage::new());
        let pipeline = Pipeline::builder(echo_script(), storage.clone())
            .build()
            .unwrap();

        let response = pipeline
            .process_turn("ctx-1", Message::text("hello"))
            .await
            .unwrap();
        assert_eq!(response.text, "echo: hello");

        let stored = storage.get("ctx-1").await.unwrap().unwrap();
        assert_eq!(stored.turn_count(), 1);
        assert_eq!(stored.last_request().unwrap().text, "hello");
        assert_eq!(stored.last_response().unwrap().text, "echo: hello");
    }

    #[tokio::test]
    async fn test_turn_indices_advance_across_turns() {
        let storage = Arc::new(InMemoryContextStorage::new());
        let pipeline = Pipeline::builder(echo_script(), storage.clone())
            .build()
            .unwrap();

        for text in ["one", "two", "three"] {
            pipeline.process_turn("ctx-1", Message::text(text)).await.unwrap();
        }
        let stored = storage.get("ctx-1").await.unwrap().unwrap();
        assert_eq!(stored.requests.len(), 3);
        assert_eq!(stored.responses.len(), 3);
        assert_eq!(stored.labels.len(), 3);
        assert_eq!(stored.next_turn_index(), 4);
    }

    #[tokio::test]
    async fn test_report_contains_actor_status() {
        let storage = Arc::new(InMemoryContextStorage::new());
        let pipeline = Pipeline::builder(echo_script(), storage).build().unwrap();
        let (_, report) = pipeline
            .process_turn_with_report("ctx-1", Message::text("hi"))
            .await
            .unwrap();
        assert_eq!(
            report.get("pipeline.actor"),
            Some(&ServiceStatus::Finished)
        );
        assert_eq!(report.get("pipeline"), Some(&ServiceStatus::Finished));
    }

    #[tokio::test]
    async fn test_pre_and_post_services_surround_actor() {
        let storage = Arc::new(InMemoryContextStorage::new());
        let pipeline = Pipeline::builder(echo_script(), storage)
            .pre_service(
                Service::new(service_fn(|ctx: SharedContext| async move {
                    ctx.write()
                        .await
                        .misc
                        .insert("pre_saw_response".to_string(), serde_json::json!(false));
                    Ok(())
                }))
                .named("pre"),
            )
            .post_service(
                Service::new(service_fn(|ctx: SharedContext| async move {
                    let has_response = ctx.read().await.last_response().is_some();
                    ctx.write()
                        .await
                        .misc
                        .insert("post_saw_response".to_string(), serde_json::json!(has_response));
                    Ok(())
                }))
                .named("post"),
            )
            .build()
            .unwrap();

        let (_, report) = pipeline
            .process_turn_with_report("ctx-1", Message::text("hi"))
            .await
            .unwrap();
        assert_eq!(report.get("pipeline.pre"), Some(&ServiceStatus::Finished));
        assert_eq!(report.get("pipeline.post"), Some(&ServiceStatus::Finished));
    }

    #[tokio::test]
    async fn test_duplicate_sibling_names_rejected_at_build() {
        let storage = Arc::new(InMemoryContextStorage::new());
        let result = Pipeline::builder(echo_script(), storage)
            .pre_service(
                Service::new(service_fn(|_ctx: SharedContext| async move { Ok(()) }))
                    .named("actor"),
            )
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_serve_loop_round_trip() {
        let storage = Arc::new(InMemoryContextStorage::new());
        let pipeline = Arc::new(Pipeline::builder(echo_script(), storage).build().unwrap());
        let (messenger, request_tx, mut response_rx) = crate::messenger::channel_messenger();

        let server = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.serve(messenger).await })
        };

        request_tx
            .send(("ctx-1".to_string(), Message::text("ping")))
            .await
            .unwrap();
        let (context_id, response) = response_rx.recv().await.unwrap();
        assert_eq!(context_id, "ctx-1");
        assert_eq!(response.text, "echo: ping");

        drop(request_tx);
        server.await.unwrap().unwrap();
    }
}
