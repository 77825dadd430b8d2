//! Service groups.
//!
//! A group is an ordered sequence of services and nested groups executed
//! against the shared context, either strictly in declaration order or
//! concurrently. Groups enforce sibling-name uniqueness and isolate child
//! failures: only a fatal child aborts the remainder of the tree.

use crate::service::{record_status, Service, SharedContext, StartCondition};
use colloquy_core::{ColloquyError, Context, Result, ServiceStatus};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A member of a [`ServiceGroup`]: either a leaf service or a nested group.
#[derive(Debug)]
pub enum Component {
    /// A leaf service.
    Service(Service),
    /// A nested group.
    Group(ServiceGroup),
}

impl Component {
    pub(crate) fn resolved_name(&self, index: usize) -> String {
        match self {
            Self::Service(service) => service.resolved_name(index),
            Self::Group(group) => group.resolved_name(index),
        }
    }

    pub(crate) fn execute<'a>(
        &'a self,
        path: String,
        ctx: &'a SharedContext,
    ) -> BoxFuture<'a, Result<ServiceStatus>> {
        match self {
            Self::Service(service) => async move { service.run(&path, ctx).await }.boxed(),
            Self::Group(group) => group.run(path, ctx),
        }
    }
}

impl From<Service> for Component {
    fn from(service: Service) -> Self {
        Self::Service(service)
    }
}

impl From<ServiceGroup> for Component {
    fn from(group: ServiceGroup) -> Self {
        Self::Group(group)
    }
}

/// An ordered collection of services and nested groups.
///
/// With `concurrent` false (the default) children execute strictly in
/// declaration order, each completing before the next starts. With
/// `concurrent` true all children start together and the group completes
/// once every child has finished, failed, or timed out.
pub struct ServiceGroup {
    name: Option<String>,
    components: Vec<Component>,
    concurrent: bool,
    start_condition: Option<StartCondition>,
}

impl ServiceGroup {
    /// Creates an empty sequential group.
    pub fn new() -> Self {
        Self {
            name: None,
            components: Vec::new(),
            concurrent: false,
            start_condition: None,
        }
    }

    /// Sets an explicit name; unnamed groups get a name computed from their
    /// position among siblings.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Switches the group between sequential and concurrent execution.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Appends a service.
    pub fn service(mut self, service: Service) -> Self {
        self.components.push(Component::Service(service));
        self
    }

    /// Appends a nested group.
    pub fn group(mut self, group: ServiceGroup) -> Self {
        self.components.push(Component::Group(group));
        self
    }

    /// Appends an already-wrapped component.
    pub fn component(mut self, component: impl Into<Component>) -> Self {
        self.components.push(component.into());
        self
    }

    /// Sets the start condition; when it evaluates false the whole group is
    /// skipped and recorded as `NOT_RUN`.
    pub fn with_start_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.start_condition = Some(Arc::new(condition));
        self
    }

    pub(crate) fn resolved_name(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("group_{index}"))
    }

    /// Validates sibling-name uniqueness recursively.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, component) in self.components.iter().enumerate() {
            let name = component.resolved_name(index);
            if !seen.insert(name.clone()) {
                return Err(ColloquyError::execution(format!(
                    "duplicate component name '{name}' among siblings"
                )));
            }
            if let Component::Group(group) = component {
                group.validate()?;
            }
        }
        Ok(())
    }

    /// Runs the group, recording per-component statuses under dotted paths
    /// rooted at `path`.
    pub(crate) fn run<'a>(
        &'a self,
        path: String,
        ctx: &'a SharedContext,
    ) -> BoxFuture<'a, Result<ServiceStatus>> {
        async move {
            if let Some(condition) = &self.start_condition {
                let skip = {
                    let guard = ctx.read().await;
                    !condition(&guard)
                };
                if skip {
                    debug!(group = %path, "start condition false, skipping");
                    record_status(ctx, &path, ServiceStatus::NotRun).await;
                    return Ok(ServiceStatus::NotRun);
                }
            }

            record_status(ctx, &path, ServiceStatus::Running).await;

            if self.concurrent {
                let children: Vec<_> = self
                    .components
                    .iter()
                    .enumerate()
                    .map(|(index, component)| {
                        let child_path = format!("{path}.{}", component.resolved_name(index));
                        component.execute(child_path, ctx)
                    })
                    .collect();
                // All children complete before a fatal error propagates.
                let results = future::join_all(children).await;
                for result in results {
                    if let Err(e) = result {
                        record_status(ctx, &path, ServiceStatus::Failed).await;
                        return Err(e);
                    }
                }
            } else {
                for (index, component) in self.components.iter().enumerate() {
                    let child_path = format!("{path}.{}", component.resolved_name(index));
                    if let Err(e) = component.execute(child_path, ctx).await {
                        record_status(ctx, &path, ServiceStatus::Failed).await;
                        return Err(e);
                    }
                }
            }

            record_status(ctx, &path, ServiceStatus::Finished).await;
            Ok(ServiceStatus::Finished)
        }
        .boxed()
    }
}

impl Default for ServiceGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceGroup")
            .field("name", &self.name)
            .field("concurrent", &self.concurrent)
            .field("components", &self.components.len())
            .finish_non_exhaustive()
    }
}
