//! User decision prompt backed by rustyline
//!
//! Presents the fixed action menu and reads revision text. Ctrl-C and
//! Ctrl-D at the menu are an explicit exit, not an error.

use crate::errors::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fmt;
use std::str::FromStr;

/// What the user wants to do with the current proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Run,
    Revise,
    Explain,
    Exit,
}

impl Action {
    /// Menu order
    pub const ALL: [Action; 4] = [Action::Run, Action::Revise, Action::Explain, Action::Exit];

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            Action::Run => "\u{2705} Run Command",
            Action::Revise => "\u{1F4DD} Revise Command",
            Action::Explain => "\u{1F4D6} Explain Command",
            Action::Exit => "\u{274C} Exit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Action {
    type Err = String;

    /// Accepts the menu number, the first letter or the word
    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "1" | "r" | "run" => Ok(Action::Run),
            "2" | "v" | "revise" => Ok(Action::Revise),
            "3" | "e" | "explain" => Ok(Action::Explain),
            "4" | "x" | "q" | "exit" | "quit" => Ok(Action::Exit),
            other => Err(format!("Unknown action: '{}'", other)),
        }
    }
}

/// Source of user decisions
pub trait DecisionPrompt {
    /// Ask which action to take; interruption yields [`Action::Exit`]
    fn choose_action(&mut self) -> Result<Action>;

    /// Ask for replacement instructions; `None` when interrupted
    fn read_revision(&mut self) -> Result<Option<String>>;
}

/// Interactive terminal prompt
pub struct TerminalPrompt {
    editor: DefaultEditor,
    prompt: String,
}

impl TerminalPrompt {
    /// Create new terminal prompt
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()?;

        Ok(TerminalPrompt {
            editor,
            prompt: "> ".to_string(),
        })
    }

    fn print_menu(&self) {
        println!("Choose an action");
        for (index, action) in Action::ALL.iter().enumerate() {
            println!("  {}. {}", index + 1, action);
        }
    }

    /// Read one line; `None` on Ctrl-C / Ctrl-D
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl DecisionPrompt for TerminalPrompt {
    fn choose_action(&mut self) -> Result<Action> {
        self.print_menu();

        loop {
            let prompt = self.prompt.clone();
            let Some(line) = self.read_line(&prompt)? else {
                tracing::debug!("action prompt interrupted");
                return Ok(Action::Exit);
            };

            match line.parse::<Action>() {
                Ok(action) => return Ok(action),
                Err(_) => println!("Please pick 1-4 (run, revise, explain, exit)."),
            }
        }
    }

    fn read_revision(&mut self) -> Result<Option<String>> {
        let line = self.read_line("Enter your revised instructions: ")?;
        if let Some(ref text) = line {
            if !text.is_empty() {
                let _ = self.editor.add_history_entry(text.as_str());
            }
        }
        Ok(line)
    }
}
