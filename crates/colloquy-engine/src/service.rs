//! Orchestrator services.
//!
//! A service wraps a single async handler together with optional before/after
//! callbacks, a start condition, and a timeout. Services are composed into
//! [`ServiceGroup`]s; the group drives execution and records each service's
//! status into the turn's scratch state.
//!
//! [`ServiceGroup`]: crate::group::ServiceGroup

use async_trait::async_trait;
use colloquy_core::{ColloquyError, Context, Result, ServiceStatus};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// The turn's context as seen by services.
///
/// Sequential group children observe all writes of prior children; concurrent
/// siblings serialize on the lock with no ordering guarantee between them.
pub type SharedContext = Arc<RwLock<Context>>;

/// Predicate deciding whether a component runs at all this turn.
pub type StartCondition = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// An async unit of work executed against the shared context.
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    /// Executes the handler.
    async fn handle(&self, ctx: &SharedContext) -> Result<()>;
}

/// Adapter turning an async closure into a [`ServiceHandler`].
///
/// ```ignore
/// let svc = Service::new(service_fn(|ctx| async move {
///     ctx.write().await.misc.insert("seen".into(), serde_json::json!(true));
///     Ok(())
/// }));
/// ```
pub struct FnHandler<F> {
    f: F,
}

/// Wraps an async closure as a [`ServiceHandler`].
pub fn service_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(SharedContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> ServiceHandler for FnHandler<F>
where
    F: Fn(SharedContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, ctx: &SharedContext) -> Result<()> {
        (self.f)(ctx.clone()).await
    }
}

/// Records a component's status into the turn scratch.
pub(crate) async fn record_status(ctx: &SharedContext, name: &str, status: ServiceStatus) {
    ctx.write()
        .await
        .scratch
        .service_status
        .insert(name.to_string(), status);
}

/// A single orchestrator execution unit.
///
/// Wraps a handler with optional before/after callbacks (logging, timing,
/// side effects), an optional per-service timeout, an optional start
/// condition, and a turn-fatal flag. A non-fatal service's failure or
/// timeout is recorded and sibling execution continues; a fatal service's
/// failure aborts the remainder of the turn.
pub struct Service {
    name: Option<String>,
    handler: Arc<dyn ServiceHandler>,
    before: Vec<Arc<dyn ServiceHandler>>,
    after: Vec<Arc<dyn ServiceHandler>>,
    timeout: Option<Duration>,
    start_condition: Option<StartCondition>,
    fatal: bool,
}

impl Service {
    /// Creates a service from a handler.
    pub fn new(handler: impl ServiceHandler + 'static) -> Self {
        Self {
            name: None,
            handler: Arc::new(handler),
            before: Vec::new(),
            after: Vec::new(),
            timeout: None,
            start_condition: None,
            fatal: false,
        }
    }

    /// Sets an explicit name; unnamed services get a name computed from
    /// their position among siblings.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a per-service timeout. The timeout cancels only this service's
    /// in-flight handler; siblings and ancestors continue.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the start condition; when it evaluates false the service is
    /// skipped and recorded as `NOT_RUN`.
    pub fn with_start_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.start_condition = Some(Arc::new(condition));
        self
    }

    /// Appends a callback run before the handler; its failure is logged,
    /// never fatal.
    pub fn with_before(mut self, handler: impl ServiceHandler + 'static) -> Self {
        self.before.push(Arc::new(handler));
        self
    }

    /// Appends a callback run after the handler; its failure is logged,
    /// never fatal.
    pub fn with_after(mut self, handler: impl ServiceHandler + 'static) -> Self {
        self.after.push(Arc::new(handler));
        self
    }

    /// Marks the service turn-fatal: a failure here aborts the remainder of
    /// the turn instead of being tolerated.
    pub fn fatal(mut self, fatal: bool) -> Self {
        self.fatal = fatal;
        self
    }

    pub(crate) fn resolved_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("service_{index}"))
    }

    /// Runs the service, recording its status under `path`.
    ///
    /// Returns `Err` only for a fatal service whose handler failed or timed
    /// out; every other outcome is absorbed into the returned status.
    pub(crate) async fn run(&self, path: &str, ctx: &SharedContext) -> Result<ServiceStatus> {
        if let Some(condition) = &self.start_condition {
            let skip = {
                let guard = ctx.read().await;
                !condition(&guard)
            };
            if skip {
                debug!(service = path, "start condition false, skipping");
                record_status(ctx, path, ServiceStatus::NotRun).await;
                return Ok(ServiceStatus::NotRun);
            }
        }

        record_status(ctx, path, ServiceStatus::Running).await;

        for handler in &self.before {
            if let Err(e) = handler.handle(ctx).await {
                warn!(service = path, error = %e, "before handler failed");
            }
        }

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.handler.handle(ctx)).await {
                Ok(result) => result.map(|_| None),
                Err(_) => Ok(Some(limit)),
            },
            None => self.handler.handle(ctx).await.map(|_| None),
        };

        let status = match outcome {
            Ok(None) => ServiceStatus::Finished,
            Ok(Some(limit)) => {
                let ms = limit.as_millis() as u64;
                warn!(service = path, timeout_ms = ms, "service timed out");
                if self.fatal {
                    record_status(ctx, path, ServiceStatus::Timeout).await;
                    return Err(ColloquyError::timeout(path, ms));
                }
                ServiceStatus::Timeout
            }
            Err(e) => {
                if self.fatal {
                    record_status(ctx, path, ServiceStatus::Failed).await;
                    return Err(e);
                }
                warn!(service = path, error = %e, "service failed");
                ServiceStatus::Failed
            }
        };
        record_status(ctx, path, status).await;

        for handler in &self.after {
            if let Err(e) = handler.handle(ctx).await {
                warn!(service = path, error = %e, "after handler failed");
            }
        }

        Ok(status)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("fatal", &self.fatal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::Message;

    fn shared_context() -> SharedContext {
        Arc::new(RwLock::new(Context::with_id("test")))
    }

    fn mark(key: &'static str) -> impl ServiceHandler {
        service_fn(move |ctx: SharedContext| async move {
            ctx.write()
                .await
                .misc
                .insert(key.to_string(), serde_json::json!(true));
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_finished_service_records_status() {
        let ctx = shared_context();
        let svc = Service::new(mark("ran")).named("svc");
        let status = svc.run("svc", &ctx).await.unwrap();
        assert_eq!(status, ServiceStatus::Finished);
        let guard = ctx.read().await;
        assert_eq!(
            guard.scratch.service_status.get("svc"),
            Some(&ServiceStatus::Finished)
        );
        assert_eq!(guard.misc.get("ran"), Some(&serde_json::json!(true)));
    }

    #[tokio::test]
    async fn test_start_condition_false_skips() {
        let ctx = shared_context();
        let svc = Service::new(mark("ran"))
            .named("svc")
            .with_start_condition(|ctx| ctx.last_request().is_some());
        let status = svc.run("svc", &ctx).await.unwrap();
        assert_eq!(status, ServiceStatus::NotRun);
        assert!(ctx.read().await.misc.get("ran").is_none());
    }

    #[tokio::test]
    async fn test_start_condition_true_runs() {
        let ctx = shared_context();
        ctx.write().await.add_request(1, Message::text("Hi"));
        let svc = Service::new(mark("ran"))
            .with_start_condition(|ctx| ctx.last_request().is_some());
        let status = svc.run("svc", &ctx).await.unwrap();
        assert_eq!(status, ServiceStatus::Finished);
    }

    #[tokio::test]
    async fn test_timeout_marks_service() {
        let ctx = shared_context();
        let svc = Service::new(service_fn(|_ctx: SharedContext| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }))
        .with_timeout(Duration::from_millis(20));
        let status = svc.run("slow", &ctx).await.unwrap();
        assert_eq!(status, ServiceStatus::Timeout);
    }

    #[tokio::test]
    async fn test_nonfatal_failure_is_absorbed() {
        let ctx = shared_context();
        let svc = Service::new(service_fn(|_ctx: SharedContext| async move {
            Err(ColloquyError::execution("boom"))
        }));
        let status = svc.run("broken", &ctx).await.unwrap();
        assert_eq!(status, ServiceStatus::Failed);
    }

    #[tokio::test]
    async fn test_fatal_failure_propagates() {
        let ctx = shared_context();
        let svc = Service::new(service_fn(|_ctx: SharedContext| async move {
            Err(ColloquyError::execution("boom"))
        }))
        .fatal(true);
        assert!(svc.run("broken", &ctx).await.is_err());
        assert_eq!(
            ctx.read().await.scratch.service_status.get("broken"),
            Some(&ServiceStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_before_after_failures_absorbed() {
        let ctx = shared_context();
        let svc = Service::new(mark("main"))
            .with_before(service_fn(|_ctx: SharedContext| async move {
                Err(ColloquyError::execution("before boom"))
            }))
            .with_after(mark("after"));
        let status = svc.run("svc", &ctx).await.unwrap();
        assert_eq!(status, ServiceStatus::Finished);
        let guard = ctx.read().await;
        assert_eq!(guard.misc.get("main"), Some(&serde_json::json!(true)));
        assert_eq!(guard.misc.get("after"), Some(&serde_json::json!(true)));
    }
}
