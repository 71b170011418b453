//! CLI module for Claix
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Verbosity, EXAMPLE_USAGE};
pub use config::Config;
