//! Terminal rendering for proposals, results and outcomes
//!
//! Color-coded headings via `colored`, a spinner while the backend is
//! working via `indicatif`.

use crate::generator::PromptKind;
use crate::resolver::Outcome;
use crate::types::CommandProposal;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Everything the resolver shows the user
pub trait Presenter {
    /// Generation request is in flight
    fn begin_generation(&mut self, kind: PromptKind);

    /// Generation request returned (successfully or not)
    fn end_generation(&mut self);

    fn show_proposal(&mut self, proposal: &CommandProposal, repair: bool);

    fn show_explanation(&mut self, explanation: Option<&str>);

    /// Shown right before asking for revised instructions
    fn show_revision_hint(&mut self);

    fn show_failure(&mut self, attempt: u32, stderr: &str);

    fn show_output(&mut self, stdout: &str);

    fn show_no_output(&mut self);

    fn show_outcome(&mut self, outcome: &Outcome);
}

/// Presenter writing to the terminal
pub struct TerminalPresenter {
    spinner_enabled: bool,
    current_bar: Option<ProgressBar>,
    tick_interval: Duration,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        TerminalPresenter {
            spinner_enabled: true,
            current_bar: None,
            tick_interval: Duration::from_millis(100),
        }
    }

    /// Disable the spinner (non-interactive output)
    pub fn without_spinner(mut self) -> Self {
        self.spinner_enabled = false;
        self
    }

    /// Finish current progress bar
    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    fn heading(&self, title: &str, color: Color) {
        println!("{}", title.color(color).bold());
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for TerminalPresenter {
    fn begin_generation(&mut self, kind: PromptKind) {
        self.finish_current();
        if !self.spinner_enabled {
            return;
        }

        let message = match kind {
            PromptKind::Initial => "Processing...",
            PromptKind::Repair => "Looking for a fix...",
        };

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(self.tick_interval);
        self.current_bar = Some(pb);
    }

    fn end_generation(&mut self) {
        self.finish_current();
    }

    fn show_proposal(&mut self, proposal: &CommandProposal, repair: bool) {
        let title = if repair { "Proposed Solution:" } else { "Proposed Command:" };
        self.heading(title, Color::Green);
        println!("{}\n", proposal.runnable().unwrap_or_default());
    }

    fn show_explanation(&mut self, explanation: Option<&str>) {
        self.heading("Explanation:", Color::Cyan);
        match explanation {
            Some(text) => println!("{}\n", text),
            None => println!("{}\n", "No explanation available.".dimmed()),
        }
    }

    fn show_revision_hint(&mut self) {
        self.heading("Revision Needed:", Color::Yellow);
        println!(
            "Please provide more details or alternative instructions to improve the proposed solution."
        );
    }

    fn show_failure(&mut self, attempt: u32, stderr: &str) {
        println!("{}", format!("Error iteration {}:", attempt).red());
        println!("{}\n", stderr);
    }

    fn show_output(&mut self, stdout: &str) {
        self.heading("Output:", Color::Blue);
        println!("{}", stdout);
    }

    fn show_no_output(&mut self) {
        self.heading("No output.", Color::Blue);
    }

    fn show_outcome(&mut self, outcome: &Outcome) {
        self.finish_current();
        match outcome {
            Outcome::Succeeded => {}
            Outcome::UserAbort => println!("{}\n", outcome.message()),
            Outcome::Unresolved => {
                self.heading("Claix Response:", Color::Red);
                println!("{}\n", outcome.message());
            }
            Outcome::GenerationBackendFailure(_)
            | Outcome::ExecutionBackendFailure(_)
            | Outcome::RetryBudgetExhausted { .. } => {
                eprintln!("{}", "Error:".red().bold());
                eprintln!("{}\n", outcome.message());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presenter_creation() {
        let presenter = TerminalPresenter::new();
        assert!(presenter.current_bar.is_none());
        assert!(presenter.spinner_enabled);
    }

    #[test]
    fn test_generation_spinner_lifecycle() {
        let mut presenter = TerminalPresenter::new();
        presenter.begin_generation(PromptKind::Initial);
        assert!(presenter.current_bar.is_some());

        presenter.end_generation();
        assert!(presenter.current_bar.is_none());
    }

    #[test]
    fn test_spinner_disabled() {
        let mut presenter = TerminalPresenter::new().without_spinner();
        presenter.begin_generation(PromptKind::Repair);
        assert!(presenter.current_bar.is_none());
    }

    #[test]
    fn test_outcome_clears_spinner() {
        let mut presenter = TerminalPresenter::new();
        presenter.begin_generation(PromptKind::Initial);
        presenter.show_outcome(&Outcome::Unresolved);
        assert!(presenter.current_bar.is_none());
    }

    #[test]
    fn test_message_display() {
        let mut presenter = TerminalPresenter::new();
        let proposal = CommandProposal::command("ls", Some("Lists files".to_string()));
        presenter.show_proposal(&proposal, false);
        presenter.show_proposal(&proposal, true);
        presenter.show_explanation(Some("Lists files"));
        presenter.show_explanation(None);
        presenter.show_revision_hint();
        presenter.show_failure(1, "ls: cannot access 'x'");
        presenter.show_output("a\nb\n");
        presenter.show_no_output();
        presenter.show_outcome(&Outcome::RetryBudgetExhausted { attempts: 3 });
    }
}
