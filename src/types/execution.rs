//! Shell execution results
//!
//! One [`ExecutionResult`] is produced per execution attempt and never
//! mutated afterwards. Exit code zero is the only success signal.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exit code reported when the process ended without one (killed by signal)
pub const NO_EXIT_CODE: i32 = -1;

/// Captured outcome of running one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Process exit status
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Wall-clock run time in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Create a result from captured output
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    /// Attach the measured run time
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Whether the command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether there is any stdout worth displaying
    pub fn has_output(&self) -> bool {
        !self.stdout.is_empty()
    }

    /// Get a human-readable summary of the execution
    pub fn summary(&self) -> String {
        let status = if self.success() { "Success" } else { "Failed" };
        format!(
            "{} (exit code {}) in {:.2}s",
            status,
            self.exit_code,
            self.duration_ms as f64 / 1000.0
        )
    }
}
