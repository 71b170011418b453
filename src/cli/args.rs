//! Command-line argument parsing for Claix
//!
//! Provides the clap-based CLI and log verbosity control.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Example invocations shown when no instructions are given
pub const EXAMPLE_USAGE: &[&str] = &[
    "claix list all docker containers",
    "claix show me active network interfaces",
];

/// Claix - turn natural-language instructions into shell commands
#[derive(Parser, Debug)]
#[command(name = "claix")]
#[command(version)]
#[command(disable_version_flag = true)]
#[command(about = "Turn natural-language instructions into shell commands", long_about = None)]
pub struct Args {
    /// What you want to do, in plain words
    #[arg(value_name = "INSTRUCTIONS", trailing_var_arg = true)]
    pub instructions: Vec<String>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide = true, hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Session name (assistant + thread pair to reuse)
    #[arg(long, value_name = "NAME")]
    pub session: Option<String>,

    /// Assistant model
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log verbosity: --verbose (info), --verbose --verbose (debug)
    #[arg(long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Instructions joined with single spaces, `None` when blank
    pub fn instructions(&self) -> Option<String> {
        let joined = self
            .instructions
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }

    /// API key, `None` when unset or blank
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        match self.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        }
    }

    /// Check that instructions were provided
    pub fn validate(&self) -> Result<(), String> {
        if self.instructions().is_none() {
            return Err("Please provide instructions for Claix.".to_string());
        }
        Ok(())
    }
}

impl Verbosity {
    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }
}
