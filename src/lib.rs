//! Claix - natural-language instructions to shell commands
//!
//! Sends the user's instructions to an LLM assistant, shows the proposed
//! command, and lets the user run, revise or explain it. Failed runs are fed
//! back to the assistant for a bounded number of automatic repairs.
//!
//! # Architecture
//!
//! - **resolver**: pure state machine plus the driver that performs its effects
//! - **generator**: prompt templates and the OpenAI Assistants client
//! - **shell**: host interpreter execution
//! - **session**: assistant/thread cache persisted across invocations
//! - **interaction**: terminal prompt and rendering

pub mod errors;
pub mod types;

pub mod generator;
pub mod resolver;
pub mod session;
pub mod shell;

pub mod cli;
pub mod interaction;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{ClaixError, Result};
pub use resolver::{Outcome, ResolutionReport, Resolver};
