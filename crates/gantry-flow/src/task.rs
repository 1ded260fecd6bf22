//! Task types and definitions

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::flow::Context;

/// Boxed future produced by a task action.
pub type ActionFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Action closure invoked each time a task runs.
pub(crate) type Action = Arc<dyn Fn(Context) -> ActionFuture + Send + Sync>;

/// A named unit of work with optional dependencies.
///
/// A task without an action is an aggregate: it exists only to depend on
/// other tasks and succeeds exactly when all of its dependencies succeed.
pub struct Task {
    pub(crate) name: String,
    pub(crate) usage: String,
    pub(crate) parallel: bool,
    pub(crate) action: Option<Action>,
    pub(crate) deps: Vec<TaskHandle>,
}

impl Task {
    /// Create a new task with a name and a human-readable usage string.
    pub fn new(name: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
            parallel: false,
            action: None,
            deps: Vec::new(),
        }
    }

    /// Mark the task safe to run concurrently with other parallel tasks.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the action to run when the task executes.
    pub fn action<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.action = Some(Arc::new(move |ctx| Box::pin(action(ctx))));
        self
    }

    /// Add dependencies that must complete before this task runs.
    pub fn depends(mut self, deps: impl IntoIterator<Item = TaskHandle>) -> Self {
        self.deps.extend(deps);
        self
    }

    /// The task's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The task's usage string.
    pub fn usage(&self) -> &str {
        &self.usage
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("parallel", &self.parallel)
            .field("has_action", &self.action.is_some())
            .field("deps", &self.deps)
            .finish()
    }
}

/// Opaque handle to a task defined in a [`Flow`](crate::Flow).
///
/// Identity is the task's name, which is unique within its flow. Handles can
/// only be obtained for tasks that are already defined, so dependency edges
/// always point at earlier definitions and the graph is acyclic by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub(crate) index: usize,
    pub(crate) name: Arc<str>,
}

impl TaskHandle {
    /// Name of the task this handle refers to.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
