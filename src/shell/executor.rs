//! Host shell executor
//!
//! Commands are passed to the interpreter as a single string (`sh -c` on
//! Unix, `cmd /C` on Windows), so pipes, redirects and globbing behave as
//! the user expects. A nonzero exit is a normal result; only a failure to
//! start the interpreter is an error.

use crate::errors::{ClaixError, Result};
use crate::types::{ExecutionResult, NO_EXIT_CODE};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Runs command strings and captures their output
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<ExecutionResult>;
}

/// Executor backed by the host command interpreter
#[derive(Debug, Clone)]
pub struct HostShell {
    program: String,
    flag: String,
}

impl Default for HostShell {
    fn default() -> Self {
        #[cfg(windows)]
        {
            Self::with_interpreter("cmd", "/C")
        }
        #[cfg(not(windows))]
        {
            Self::with_interpreter("sh", "-c")
        }
    }
}

impl HostShell {
    /// Platform default interpreter
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom interpreter, e.g. `("bash", "-c")`
    pub fn with_interpreter(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }
}

#[async_trait]
impl ShellExecutor for HostShell {
    async fn execute(&self, command: &str) -> Result<ExecutionResult> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.flag)
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::info!(shell = %self.program, command, "executing command");

        let output = cmd.output().await.map_err(|e| {
            ClaixError::Execution(format!("Failed to start '{}': {}", self.program, e))
        })?;

        let result = ExecutionResult::new(
            output.status.code().unwrap_or(NO_EXIT_CODE),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        )
        .with_duration(start.elapsed());

        tracing::info!(summary = %result.summary(), "command finished");

        Ok(result)
    }
}
