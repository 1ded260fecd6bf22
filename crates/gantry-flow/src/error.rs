//! Error types for the flow engine

use thiserror::Error;

/// Errors from defining or selecting tasks in a [`Flow`](crate::Flow).
#[derive(Debug, Error)]
pub enum FlowError {
    /// A task with the same name is already defined.
    #[error("task '{0}' is already defined")]
    DuplicateTask(String),

    /// A requested task does not exist.
    #[error("unknown task '{0}'")]
    UnknownTask(String),
}
