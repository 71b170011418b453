//! Command proposals returned by the generation backend
//!
//! The backend answers with a loosely-typed JSON object. [`RawProposal`]
//! accepts whatever subset of fields arrives; [`RawProposal::normalize`] turns
//! it into the strict [`CommandProposal`] the resolver works with. A proposal
//! without a usable command is never a command, whatever the backend claimed.

use serde::{Deserialize, Serialize};

/// Reply the assistant uses for requests it cannot map to a command
pub const UNRESOLVED_SENTINEL: &str = ".";

/// Candidate shell command plus explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandProposal {
    /// True if `command` is something that can be run
    pub is_command: bool,

    /// The command string to execute
    pub command: Option<String>,

    /// Why the command solves the instructions
    pub explanation: Option<String>,
}

impl CommandProposal {
    /// Proposal for a runnable command
    pub fn command(command: impl Into<String>, explanation: Option<String>) -> Self {
        RawProposal {
            is_command: Some(true),
            command: Some(command.into()),
            explanation,
        }
        .normalize()
    }

    /// Proposal meaning "cannot resolve these instructions"
    pub fn unresolved() -> Self {
        Self {
            is_command: false,
            command: None,
            explanation: None,
        }
    }

    /// Command to run, only when the proposal is runnable
    pub fn runnable(&self) -> Option<&str> {
        if self.is_command {
            self.command.as_deref()
        } else {
            None
        }
    }

    /// Explanation, only when the proposal is runnable
    pub fn explanation(&self) -> Option<&str> {
        if self.is_command {
            self.explanation.as_deref()
        } else {
            None
        }
    }
}

/// Proposal payload exactly as deserialized from the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProposal {
    #[serde(default)]
    pub is_command: Option<bool>,

    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub explanation: Option<String>,
}

impl RawProposal {
    /// Validate into a [`CommandProposal`]
    ///
    /// Empty, whitespace-only and sentinel commands force `is_command=false`;
    /// a missing `is_command` flag is inferred from the command.
    pub fn normalize(self) -> CommandProposal {
        let command = self
            .command
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && c != UNRESOLVED_SENTINEL);

        let explanation = self
            .explanation
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let is_command = command.is_some() && self.is_command.unwrap_or(true);

        if !is_command {
            return CommandProposal::unresolved();
        }

        CommandProposal {
            is_command,
            command,
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runnable_proposal() {
        let proposal = CommandProposal::command("docker ps -a", Some("Lists containers".into()));
        assert!(proposal.is_command);
        assert_eq!(proposal.runnable(), Some("docker ps -a"));
        assert_eq!(proposal.explanation(), Some("Lists containers"));
    }

    #[test]
    fn test_empty_command_is_not_a_command() {
        let proposal = RawProposal {
            is_command: Some(true),
            command: Some("   ".to_string()),
            explanation: Some("nothing".to_string()),
        }
        .normalize();

        assert!(!proposal.is_command);
        assert!(proposal.runnable().is_none());
        assert!(proposal.explanation().is_none());
    }

    #[test]
    fn test_missing_command_is_not_a_command() {
        let proposal = RawProposal {
            is_command: Some(true),
            command: None,
            explanation: None,
        }
        .normalize();

        assert_eq!(proposal, CommandProposal::unresolved());
    }

    #[test]
    fn test_sentinel_is_not_a_command() {
        let proposal = RawProposal {
            is_command: Some(true),
            command: Some(".".to_string()),
            explanation: None,
        }
        .normalize();

        assert!(!proposal.is_command);
    }

    #[test]
    fn test_backend_refusal_wins_over_command() {
        let proposal = RawProposal {
            is_command: Some(false),
            command: Some("rm -rf build".to_string()),
            explanation: Some("cleans".to_string()),
        }
        .normalize();

        assert!(!proposal.is_command);
        assert!(proposal.command.is_none());
    }

    #[test]
    fn test_missing_flag_inferred_from_command() {
        let raw: RawProposal = serde_json::from_str(r#"{"command": "ls -la"}"#).unwrap();
        let proposal = raw.normalize();
        assert!(proposal.is_command);
        assert_eq!(proposal.runnable(), Some("ls -la"));
        assert!(proposal.explanation.is_none());
    }

    #[test]
    fn test_command_is_trimmed() {
        let proposal = CommandProposal::command("  ip addr show \n", None);
        assert_eq!(proposal.runnable(), Some("ip addr show"));
    }

    #[test]
    fn test_null_fields_deserialize() {
        let raw: RawProposal =
            serde_json::from_str(r#"{"is_command": false, "command": null, "explanation": null}"#)
                .unwrap();
        assert_eq!(raw.normalize(), CommandProposal::unresolved());
    }
}
