//! Prompt templates sent to the generation backend

use serde::{Deserialize, Serialize};

/// Host OS family named in the assistant instructions
pub fn user_os() -> &'static str {
    if cfg!(windows) {
        "Windows"
    } else {
        "Posix"
    }
}

/// System instructions the assistant is created with
pub fn assistant_instructions() -> String {
    let os = user_os();
    format!(
        "Claix exclusively provides CLI command translations in plain text for any OS but specially {os}, \
with no code blocks or additional formatting. When a user's input aligns with {os} CLI commands, \
Claix responds with the exact command in simple text followed by a brief explanation of its function \
in simple text. If the input is unrelated to {os} CLI commands, Claix replies with a single '.' to \
maintain focus on its primary role.\n\n\
This GPT avoids any execution or simulation of CLI commands and does not engage in discussions beyond \
{os} CLI command translation and explanation. Claix's responses are concise, delivering {os} CLI \
commands along with succinct explanations in an unembellished, clear format, ensuring users receive \
direct and unformatted command syntax and understanding for their {os}-related inquiries."
    )
}

/// Instructions for turning a free-text assistant reply into a proposal
pub const EXTRACTION_INSTRUCTIONS: &str = "Extract the CLI command and its explanation from the \
message. If the message is a single '.', empty, or does not contain a command, set is_command to \
false and leave command and explanation null. Return the command exactly as written, without code \
fences or prompts.";

/// Which template produced a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptKind {
    /// Fresh instructions from the user
    Initial,

    /// Instructions plus a failed command and its stderr
    Repair,
}

/// One request to the generation backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: PromptKind,
    pub prompt: String,
}

impl GenerationRequest {
    /// Request a command for fresh instructions
    pub fn initial(instructions: &str) -> Self {
        Self {
            kind: PromptKind::Initial,
            prompt: instructions.to_string(),
        }
    }

    /// Request a fix for a command that exited nonzero
    pub fn repair(instructions: &str, command: &str, stderr: &str) -> Self {
        Self {
            kind: PromptKind::Repair,
            prompt: repair_prompt(instructions, command, stderr),
        }
    }
}

/// Fold the failure context into a new prompt
pub fn repair_prompt(instructions: &str, command: &str, stderr: &str) -> String {
    format!(
        "I want to: '{instructions}'\n\
I tried '{command}'\n\
but got this error: '{stderr}'\n\n\
Having this error in mind, fix my original command of '{command}' \
or give me a new command to solve: '{instructions}'"
    )
}
