//! Command-resolution state machine
//!
//! The machine is a plain value plus a pure transition function:
//!
//! ```text
//! transition: ResolutionState × Event → Result<(ResolutionState, [Effect])>
//! ```
//!
//! Effects describe the I/O the driver must perform next (ask the generator,
//! prompt the user, run the command, render something). Performing an effect
//! yields the next event. Nothing in this module touches the terminal, the
//! network or a process.
//!
//! Valid transitions:
//! 1.  ProcessInstructions → ProcessInstructions (on: Start, emits Generate)
//! 2.  ProcessInstructions → UserDecision   (on: Proposed, runnable)
//! 3.  ProcessInstructions → Exit           (on: Proposed unresolved | GenerationFailed)
//! 4.  UserDecision        → Exit           (on: Decided(Exit) | Interrupted)
//! 5.  UserDecision        → GatherRevision (on: Decided(Revise))
//! 6.  UserDecision        → Explain        (on: Decided(Explain))
//! 7.  UserDecision        → RunCommand     (on: Decided(Run))
//! 8.  Explain             → UserDecision   (on: Explained)
//! 9.  GatherRevision      → ProcessInstructions (on: Revised)
//! 10. GatherRevision      → Exit           (on: Interrupted)
//! 11. RunCommand          → Exit           (on: Executed ok | ExecutionFailed)
//! 12. RunCommand          → HandleFailure  (on: Executed nonzero, budget left)
//! 13. RunCommand          → Exit           (on: Executed nonzero, budget spent)
//! 14. HandleFailure       → UserDecision   (on: Proposed, runnable)
//! 15. HandleFailure       → Exit           (on: Proposed unresolved | GenerationFailed)
//! 16. Exit                → Exit           (terminal, absorbs everything)

use crate::errors::{ClaixError, Result};
use crate::generator::GenerationRequest;
use crate::interaction::Action;
use crate::types::{CommandProposal, ExecutionResult};

/// Automatic repair generations allowed per failure episode
pub const MAX_ERROR_ITERATIONS: u32 = 3;

/// Resolution phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for a proposal for the current instructions
    ProcessInstructions,

    /// Proposal shown, waiting for the user's action
    UserDecision,

    /// Waiting for replacement instructions
    GatherRevision,

    /// Explanation shown, waiting for acknowledgement
    Explain,

    /// Command handed to the shell
    RunCommand,

    /// Command failed, waiting for a repaired proposal
    HandleFailure,

    /// Terminal
    Exit,
}

impl Phase {
    /// Check if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Exit)
    }

    /// Human-readable phase name
    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::ProcessInstructions => "Processing Instructions",
            Phase::UserDecision => "Awaiting Decision",
            Phase::GatherRevision => "Gathering Revision",
            Phase::Explain => "Explaining",
            Phase::RunCommand => "Running Command",
            Phase::HandleFailure => "Handling Failure",
            Phase::Exit => "Finished",
        }
    }
}

/// How a resolution run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Command ran and exited zero
    Succeeded,

    /// User chose exit or interrupted a prompt
    UserAbort,

    /// Generator could not map the instructions to a command
    Unresolved,

    /// Transport/auth/run failure talking to the generator
    GenerationBackendFailure(String),

    /// Shell interpreter could not be run
    ExecutionBackendFailure(String),

    /// Repairs kept failing
    RetryBudgetExhausted { attempts: u32 },
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Succeeded | Outcome::UserAbort | Outcome::Unresolved => 0,
            Outcome::GenerationBackendFailure(_)
            | Outcome::ExecutionBackendFailure(_)
            | Outcome::RetryBudgetExhausted { .. } => 1,
        }
    }

    /// Whether the outcome is a failure the user must be told about
    pub fn is_failure(&self) -> bool {
        !matches!(self, Outcome::Succeeded | Outcome::UserAbort)
    }

    /// Message shown to the user
    pub fn message(&self) -> String {
        match self {
            Outcome::Succeeded => "Command completed successfully.".to_string(),
            Outcome::UserAbort => "Exiting Claix.".to_string(),
            Outcome::Unresolved => "I don't know how to solve this problem, exiting".to_string(),
            Outcome::GenerationBackendFailure(reason) => {
                format!("Could not get a command from the generation backend: {}", reason)
            }
            Outcome::ExecutionBackendFailure(reason) => {
                format!("Could not run the command in the shell: {}", reason)
            }
            Outcome::RetryBudgetExhausted { attempts } => {
                format!("Too many errors after {} repair attempts, exiting", attempts)
            }
        }
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin resolving the initial instructions
    Start,

    /// Generator returned a (normalized) proposal
    Proposed(CommandProposal),

    /// Generator call failed
    GenerationFailed(String),

    /// User picked an action
    Decided(Action),

    /// User interrupted a prompt
    Interrupted,

    /// Explanation has been displayed
    Explained,

    /// User supplied replacement instructions
    Revised(String),

    /// Shell returned a result
    Executed(ExecutionResult),

    /// Shell could not run the command
    ExecutionFailed(String),
}

impl Event {
    /// Event name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "Start",
            Event::Proposed(_) => "Proposed",
            Event::GenerationFailed(_) => "GenerationFailed",
            Event::Decided(_) => "Decided",
            Event::Interrupted => "Interrupted",
            Event::Explained => "Explained",
            Event::Revised(_) => "Revised",
            Event::Executed(_) => "Executed",
            Event::ExecutionFailed(_) => "ExecutionFailed",
        }
    }
}

/// Work the driver must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the generator; answer with `Proposed` or `GenerationFailed`
    Generate(GenerationRequest),

    /// Render a proposal (`repair` marks a failure-driven one)
    ShowProposal {
        proposal: CommandProposal,
        repair: bool,
    },

    /// Ask for an action; answer with `Decided` or `Interrupted`
    PromptAction,

    /// Ask for revision text; answer with `Revised` or `Interrupted`
    PromptRevision,

    /// Render the explanation; answer with `Explained`
    ShowExplanation(Option<String>),

    /// Render a failed run
    ShowFailure { attempt: u32, stderr: String },

    /// Run the command; answer with `Executed` or `ExecutionFailed`
    Execute(String),

    /// Render stdout of a successful run
    ShowOutput(String),

    /// Successful run printed nothing
    ShowNoOutput,

    /// Run is over
    Finish(Outcome),
}

/// Complete machine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionState {
    phase: Phase,
    instructions: String,
    proposal: Option<CommandProposal>,
    retries: u32,
    repairing: bool,
    last_failure: Option<ExecutionResult>,
    outcome: Option<Outcome>,
}

impl ResolutionState {
    /// Fresh state for the given instructions
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            phase: Phase::ProcessInstructions,
            instructions: instructions.into(),
            proposal: None,
            retries: 0,
            repairing: false,
            last_failure: None,
            outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current instructions (replaced wholesale on revision)
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn proposal(&self) -> Option<&CommandProposal> {
        self.proposal.as_ref()
    }

    /// Repairs executed in the current failure episode
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether the current proposal came from a repair prompt
    pub fn is_repairing(&self) -> bool {
        self.repairing
    }

    pub fn last_failure(&self) -> Option<&ExecutionResult> {
        self.last_failure.as_ref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ResolutionState,
    pub effects: Vec<Effect>,
}

/// Apply one event
pub fn transition(mut state: ResolutionState, event: Event) -> Result<Transition> {
    use Phase::*;

    let effects = match (state.phase, event) {
        (Exit, _) => Vec::new(),

        (ProcessInstructions, Event::Start) => {
            vec![Effect::Generate(GenerationRequest::initial(&state.instructions))]
        }
        (ProcessInstructions, Event::Proposed(proposal)) => {
            accept_proposal(&mut state, proposal, false)
        }
        (HandleFailure, Event::Proposed(proposal)) => accept_proposal(&mut state, proposal, true),
        (ProcessInstructions | HandleFailure, Event::GenerationFailed(reason)) => {
            finish(&mut state, Outcome::GenerationBackendFailure(reason))
        }

        (UserDecision, Event::Decided(action)) => decide(&mut state, action)?,
        (UserDecision | GatherRevision, Event::Interrupted) => {
            finish(&mut state, Outcome::UserAbort)
        }

        (Explain, Event::Explained) => {
            state.phase = UserDecision;
            vec![Effect::PromptAction]
        }

        (GatherRevision, Event::Revised(text)) => revise(&mut state, &text),

        (RunCommand, Event::Executed(result)) => {
            if result.success() {
                let shown = if result.has_output() {
                    Effect::ShowOutput(result.stdout)
                } else {
                    Effect::ShowNoOutput
                };
                let mut effects = vec![shown];
                effects.extend(finish(&mut state, Outcome::Succeeded));
                effects
            } else {
                handle_failure(&mut state, result)
            }
        }
        (RunCommand, Event::ExecutionFailed(reason)) => {
            finish(&mut state, Outcome::ExecutionBackendFailure(reason))
        }

        (phase, event) => {
            return Err(ClaixError::InvalidTransition {
                from: format!("{:?}", phase),
                event: event.name().to_string(),
                reason: format!("{} does not accept {}", phase.display_name(), event.name()),
            });
        }
    };

    Ok(Transition { state, effects })
}

fn accept_proposal(
    state: &mut ResolutionState,
    proposal: CommandProposal,
    repair: bool,
) -> Vec<Effect> {
    let runnable = proposal
        .runnable()
        .map(|command| !command.trim().is_empty())
        .unwrap_or(false);

    // Unresolved repairs end the run without touching the budget
    if !runnable {
        return finish(state, Outcome::Unresolved);
    }

    state.proposal = Some(proposal.clone());
    state.repairing = repair;
    state.phase = Phase::UserDecision;

    vec![Effect::ShowProposal { proposal, repair }, Effect::PromptAction]
}

fn decide(state: &mut ResolutionState, action: Action) -> Result<Vec<Effect>> {
    let effects = match action {
        Action::Exit => finish(state, Outcome::UserAbort),
        Action::Revise => {
            state.phase = Phase::GatherRevision;
            vec![Effect::PromptRevision]
        }
        Action::Explain => {
            state.phase = Phase::Explain;
            let explanation = state
                .proposal
                .as_ref()
                .and_then(|p| p.explanation())
                .map(str::to_string);
            vec![Effect::ShowExplanation(explanation)]
        }
        Action::Run => {
            let command = state
                .proposal
                .as_ref()
                .and_then(|p| p.runnable())
                .map(str::to_string)
                .ok_or_else(|| ClaixError::InvalidTransition {
                    from: format!("{:?}", state.phase),
                    event: "Decided".to_string(),
                    reason: "no runnable proposal".to_string(),
                })?;

            if state.repairing {
                state.retries += 1;
            }
            state.phase = Phase::RunCommand;
            vec![Effect::Execute(command)]
        }
    };

    Ok(effects)
}

fn revise(state: &mut ResolutionState, text: &str) -> Vec<Effect> {
    let text = text.trim();
    if text.is_empty() {
        return vec![Effect::PromptRevision];
    }

    state.instructions = text.to_string();
    state.proposal = None;
    state.retries = 0;
    state.repairing = false;
    state.last_failure = None;
    state.phase = Phase::ProcessInstructions;

    vec![Effect::Generate(GenerationRequest::initial(&state.instructions))]
}

fn handle_failure(state: &mut ResolutionState, result: ExecutionResult) -> Vec<Effect> {
    // A fresh proposal starts a new failure episode
    if !state.repairing {
        state.retries = 0;
    }
    state.phase = Phase::HandleFailure;

    let command = state
        .proposal
        .as_ref()
        .and_then(|p| p.runnable())
        .unwrap_or_default()
        .to_string();

    let mut effects = vec![Effect::ShowFailure {
        attempt: state.retries,
        stderr: result.stderr.clone(),
    }];

    let request = GenerationRequest::repair(&state.instructions, &command, &result.stderr);
    state.last_failure = Some(result);

    if state.retries >= MAX_ERROR_ITERATIONS {
        let attempts = state.retries;
        effects.extend(finish(state, Outcome::RetryBudgetExhausted { attempts }));
        return effects;
    }

    effects.push(Effect::Generate(request));
    effects
}

fn finish(state: &mut ResolutionState, outcome: Outcome) -> Vec<Effect> {
    state.phase = Phase::Exit;
    state.outcome = Some(outcome.clone());
    vec![Effect::Finish(outcome)]
}
