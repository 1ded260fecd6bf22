//! Per-run registry of category task handles

use gantry_flow::TaskHandle;

/// Task categories used to build the aggregate tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Format,
    Generate,
    Lint,
    Test,
}

/// Ordered collections of the tasks defined during one orchestration call.
///
/// A registry is constructed fresh per call to
/// [`define_tasks`](crate::define_tasks) and read by the aggregate assembly
/// strictly after all registration is done, so repeated orchestration calls
/// in one process stay independent. There is no removal operation.
#[derive(Debug, Default)]
pub struct Registry {
    format: Vec<TaskHandle>,
    generate: Vec<TaskHandle>,
    lint: Vec<TaskHandle>,
    test: Vec<TaskHandle>,
    downloads: Vec<String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to its category. Insertion order becomes the category
    /// aggregate's dependency order.
    pub fn register(&mut self, category: Category, handle: TaskHandle) {
        match category {
            Category::Format => self.format.push(handle),
            Category::Generate => self.generate.push(handle),
            Category::Lint => self.lint.push(handle),
            Category::Test => self.test.push(handle),
        }
    }

    /// Tasks registered for a category so far, in insertion order.
    pub fn enumerate(&self, category: Category) -> &[TaskHandle] {
        match category {
            Category::Format => &self.format,
            Category::Generate => &self.generate,
            Category::Lint => &self.lint,
            Category::Test => &self.test,
        }
    }

    /// Register commands the download task runs to fetch build tools. Each
    /// command is executed as-is and must exit successfully. Duplicates are
    /// kept once, preserving first-registration order.
    pub fn register_downloads<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = String>,
    {
        for command in commands {
            if !self.downloads.contains(&command) {
                self.downloads.push(command);
            }
        }
    }

    /// Registered download commands, in first-registration order.
    pub fn downloads(&self) -> &[String] {
        &self.downloads
    }
}
