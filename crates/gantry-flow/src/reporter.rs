//! Flow execution reporting

use std::time::Duration;

/// Events emitted while a flow runs.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    /// A task is starting execution.
    TaskStarted { name: String },
    /// A task completed successfully.
    TaskCompleted { name: String, duration: Duration },
    /// A task failed.
    TaskFailed { name: String, duration: Duration },
    /// A task was not run.
    TaskSkipped { name: String, reason: String },
    /// An execution wave is starting.
    WaveStarted { wave: usize, task_count: usize },
    /// The run finished.
    RunCompleted {
        total: usize,
        succeeded: usize,
        failed: usize,
        skipped: usize,
        duration: Duration,
    },
}

/// Trait for observing flow execution progress.
pub trait Reporter: Send + Sync {
    /// Handle a flow event.
    fn report(&self, event: &FlowEvent);
}

/// Reporter that logs events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &FlowEvent) {
        match event {
            FlowEvent::TaskStarted { name } => {
                tracing::info!("----- {} starting", name);
            }
            FlowEvent::TaskCompleted { name, duration } => {
                tracing::info!("----- {} ok ({:.2}s)", name, duration.as_secs_f64());
            }
            FlowEvent::TaskFailed { name, duration } => {
                tracing::error!("----- {} failed ({:.2}s)", name, duration.as_secs_f64());
            }
            FlowEvent::TaskSkipped { name, reason } => {
                tracing::warn!("----- {} skipped: {}", name, reason);
            }
            FlowEvent::WaveStarted { wave, task_count } => {
                tracing::debug!("wave {} ({} tasks)", wave, task_count);
            }
            FlowEvent::RunCompleted {
                total,
                succeeded,
                failed,
                skipped,
                duration,
            } => {
                if *failed == 0 && *skipped == 0 {
                    tracing::info!(
                        "{}/{} tasks succeeded ({:.2}s)",
                        succeeded,
                        total,
                        duration.as_secs_f64()
                    );
                } else {
                    tracing::error!(
                        "{}/{} tasks succeeded, {} failed, {} skipped ({:.2}s)",
                        succeeded,
                        total,
                        failed,
                        skipped,
                        duration.as_secs_f64()
                    );
                }
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing).
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: std::sync::Mutex<Vec<FlowEvent>>,
}

impl CollectingReporter {
    /// All collected events, in arrival order.
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of tasks that reported a given predicate, in arrival order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FlowEvent::TaskStarted { name } => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, event: &FlowEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::default();

        reporter.report(&FlowEvent::TaskStarted {
            name: "lint-rust".to_string(),
        });
        reporter.report(&FlowEvent::TaskCompleted {
            name: "lint-rust".to_string(),
            duration: Duration::from_secs(2),
        });

        assert_eq!(reporter.events().len(), 2);
        assert_eq!(reporter.started(), vec!["lint-rust"]);
    }

    #[test]
    fn test_tracing_reporter_does_not_panic() {
        let reporter = TracingReporter;
        reporter.report(&FlowEvent::RunCompleted {
            total: 3,
            succeeded: 2,
            failed: 1,
            skipped: 0,
            duration: Duration::from_millis(1500),
        });
    }
}
