//! Exit codes for flow binaries

/// Success
pub const SUCCESS: u8 = 0;

/// One or more tasks failed
pub const TASK_FAILED: u8 = 1;

/// Unknown task or bad invocation
pub const USAGE_ERROR: u8 = 2;
