//! Shell execution module
//!
//! Runs a proposed command through the host command interpreter.

pub mod executor;

// Re-export commonly used types
pub use executor::{HostShell, ShellExecutor};
