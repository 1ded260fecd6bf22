//! Flow definition and execution

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::error::FlowError;
use crate::reporter::{FlowEvent, Reporter};
use crate::task::{Action, Task, TaskHandle};

/// Options for a single flow run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Command string for tasks that execute a command in every workspace
    /// member, carried from the `--cmd` flag.
    pub command: Option<String>,
    /// Maximum number of parallel tasks in flight at once.
    pub concurrency: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            command: None,
            concurrency: available_parallelism(),
        }
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Per-task execution context handed to actions.
///
/// Errors reported here mark the owning task failed without aborting it or
/// any sibling task.
#[derive(Clone)]
pub struct Context {
    name: Arc<str>,
    options: Arc<RunOptions>,
    failed: Arc<AtomicBool>,
}

impl Context {
    /// Name of the running task.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The run's `--cmd` string, if one was given.
    pub fn command(&self) -> Option<&str> {
        self.options.command.as_deref()
    }

    /// Log a task-scoped informational message.
    pub fn log(&self, message: impl fmt::Display) {
        tracing::info!(task = %self.name, "{message}");
    }

    /// Report a task-local error. The task keeps running but is recorded as
    /// failed once its action returns.
    pub fn error(&self, message: impl fmt::Display) {
        self.failed.store(true, Ordering::SeqCst);
        tracing::error!(task = %self.name, "{message}");
    }

    /// Whether an error has been reported on this task so far.
    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Final status of one task in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task's action completed without reporting an error.
    Success,
    /// The task ran and reported at least one error.
    Failed,
    /// The task was not run because a dependency did not succeed.
    DependencyFailed,
}

/// Outcome of one task in a completed run.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// Task name.
    pub name: String,
    /// Final status.
    pub status: TaskStatus,
}

/// Result of a completed flow run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    outcomes: Vec<TaskOutcome>,
    duration: Duration,
}

impl RunSummary {
    /// Whether every executed task succeeded.
    pub fn success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == TaskStatus::Success)
    }

    /// All task outcomes, in definition order.
    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    /// Status of a task by name, if it was part of the run.
    pub fn status_of(&self, name: &str) -> Option<&TaskStatus> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.status)
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// An ordered collection of defined tasks and the engine that runs them.
#[derive(Debug, Default)]
pub struct Flow {
    tasks: Vec<Task>,
    by_name: HashMap<String, usize>,
    default_task: Option<TaskHandle>,
}

impl Flow {
    /// Create an empty flow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a task, returning its handle. Names must be unique.
    pub fn define(&mut self, task: Task) -> Result<TaskHandle, FlowError> {
        if self.by_name.contains_key(&task.name) {
            return Err(FlowError::DuplicateTask(task.name.clone()));
        }
        let handle = TaskHandle {
            index: self.tasks.len(),
            name: Arc::from(task.name.as_str()),
        };
        self.by_name.insert(task.name.clone(), handle.index);
        self.tasks.push(task);
        Ok(handle)
    }

    /// Set the task run when no task name is given on the command line.
    pub fn set_default(&mut self, handle: TaskHandle) {
        self.default_task = Some(handle);
    }

    /// The default task, if one has been set.
    pub fn default_task(&self) -> Option<&TaskHandle> {
        self.default_task.as_ref()
    }

    /// Look up a defined task by name.
    pub fn lookup(&self, name: &str) -> Option<TaskHandle> {
        self.by_name.get(name).map(|&index| TaskHandle {
            index,
            name: Arc::from(name),
        })
    }

    /// Dependency handles of a task, in declaration order.
    pub fn dependencies(&self, handle: &TaskHandle) -> &[TaskHandle] {
        self.tasks
            .get(handle.index)
            .map(|t| t.deps.as_slice())
            .unwrap_or(&[])
    }

    /// All defined tasks as (name, usage) pairs, sorted by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .tasks
            .iter()
            .map(|t| (t.name.as_str(), t.usage.as_str()))
            .collect();
        entries.sort_by_key(|&(name, _)| name);
        entries
    }

    /// Run the named tasks and their transitive dependencies, each at most
    /// once.
    ///
    /// Dependencies run before dependents, grouped into waves. Within a
    /// wave, parallel-safe tasks run concurrently up to the configured
    /// concurrency; the rest run one at a time afterwards. A failing task
    /// never cancels siblings already scheduled, but tasks whose
    /// dependencies did not succeed are skipped and counted as failed.
    pub async fn execute(
        &self,
        names: &[String],
        options: RunOptions,
        reporter: Arc<dyn Reporter>,
    ) -> Result<RunSummary, FlowError> {
        let start = Instant::now();
        let options = Arc::new(options);

        let mut requested = Vec::with_capacity(names.len());
        for name in names {
            let index = self
                .by_name
                .get(name.as_str())
                .copied()
                .ok_or_else(|| FlowError::UnknownTask(name.clone()))?;
            requested.push(index);
        }

        // Transitive dependency closure of the requested tasks.
        let mut in_closure = vec![false; self.tasks.len()];
        let mut stack = requested;
        while let Some(index) = stack.pop() {
            let Some(entry) = in_closure.get_mut(index) else {
                continue;
            };
            if *entry {
                continue;
            }
            *entry = true;
            if let Some(task) = self.tasks.get(index) {
                stack.extend(task.deps.iter().map(|d| d.index));
            }
        }

        // Dependency handles always reference earlier definitions, so a
        // single ascending pass yields wave levels (longest dependency
        // chain below each task).
        let mut wave_of = vec![0usize; self.tasks.len()];
        let mut max_wave = 0usize;
        for (index, task) in self.tasks.iter().enumerate() {
            if !in_closure[index] {
                continue;
            }
            let wave = task
                .deps
                .iter()
                .map(|d| wave_of[d.index] + 1)
                .max()
                .unwrap_or(0);
            wave_of[index] = wave;
            max_wave = max_wave.max(wave);
        }
        let mut waves: Vec<Vec<usize>> = vec![Vec::new(); max_wave + 1];
        for (index, &wave) in wave_of.iter().enumerate() {
            if in_closure[index] {
                waves[wave].push(index);
            }
        }

        let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
        let mut statuses: Vec<Option<TaskStatus>> = vec![None; self.tasks.len()];

        for (wave_index, wave) in waves.iter().enumerate() {
            reporter.report(&FlowEvent::WaveStarted {
                wave: wave_index,
                task_count: wave.len(),
            });

            let mut spawned = Vec::new();
            let mut serial = Vec::new();

            for &index in wave {
                let Some(task) = self.tasks.get(index) else {
                    continue;
                };

                let dep_failed = task.deps.iter().any(|d| {
                    !matches!(
                        statuses.get(d.index).and_then(|s| s.as_ref()),
                        Some(TaskStatus::Success)
                    )
                });
                if dep_failed {
                    statuses[index] = Some(TaskStatus::DependencyFailed);
                    reporter.report(&FlowEvent::TaskSkipped {
                        name: task.name.clone(),
                        reason: "dependency failed".to_string(),
                    });
                    continue;
                }

                let Some(action) = task.action.clone() else {
                    // Aggregate: all dependencies succeeded, nothing to run.
                    statuses[index] = Some(TaskStatus::Success);
                    continue;
                };

                let name: Arc<str> = Arc::from(task.name.as_str());
                if task.parallel {
                    let semaphore = Arc::clone(&semaphore);
                    let options = Arc::clone(&options);
                    let reporter = Arc::clone(&reporter);
                    let handle = tokio::spawn(async move {
                        let _permit = semaphore.acquire_owned().await.ok();
                        run_task(name, action, options, reporter).await
                    });
                    spawned.push((index, handle));
                } else {
                    serial.push((index, name, action));
                }
            }

            for (index, handle) in spawned {
                statuses[index] = Some(match handle.await {
                    Ok(status) => status,
                    Err(err) => {
                        reporter.report(&FlowEvent::TaskFailed {
                            name: self
                                .tasks
                                .get(index)
                                .map(|t| t.name.clone())
                                .unwrap_or_default(),
                            duration: Duration::ZERO,
                        });
                        tracing::error!("task panicked: {err}");
                        TaskStatus::Failed
                    }
                });
            }

            // Non-parallel tasks run exclusively, after the parallel batch.
            for (index, name, action) in serial {
                let handle = tokio::spawn(run_task(
                    name,
                    action,
                    Arc::clone(&options),
                    Arc::clone(&reporter),
                ));
                statuses[index] = Some(match handle.await {
                    Ok(status) => status,
                    Err(err) => {
                        tracing::error!("task panicked: {err}");
                        TaskStatus::Failed
                    }
                });
            }
        }

        let outcomes: Vec<TaskOutcome> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|&(index, _)| in_closure[index])
            .map(|(index, task)| TaskOutcome {
                name: task.name.clone(),
                status: statuses
                    .get(index)
                    .and_then(|s| s.clone())
                    .unwrap_or(TaskStatus::DependencyFailed),
            })
            .collect();

        let duration = start.elapsed();
        let succeeded = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Success)
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Failed)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::DependencyFailed)
            .count();
        reporter.report(&FlowEvent::RunCompleted {
            total: outcomes.len(),
            succeeded,
            failed,
            skipped,
            duration,
        });

        Ok(RunSummary { outcomes, duration })
    }
}

async fn run_task(
    name: Arc<str>,
    action: Action,
    options: Arc<RunOptions>,
    reporter: Arc<dyn Reporter>,
) -> TaskStatus {
    let start = Instant::now();
    reporter.report(&FlowEvent::TaskStarted {
        name: name.to_string(),
    });

    let failed = Arc::new(AtomicBool::new(false));
    let ctx = Context {
        name: Arc::clone(&name),
        options,
        failed: Arc::clone(&failed),
    };
    action(ctx).await;

    let duration = start.elapsed();
    if failed.load(Ordering::SeqCst) {
        reporter.report(&FlowEvent::TaskFailed {
            name: name.to_string(),
            duration,
        });
        TaskStatus::Failed
    } else {
        reporter.report(&FlowEvent::TaskCompleted {
            name: name.to_string(),
            duration,
        });
        TaskStatus::Success
    }
}
