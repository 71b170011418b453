//! Resolver - drives the state machine against real collaborators
//!
//! Feeds `Start`, performs each effect the machine emits, and turns the
//! answers (proposals, decisions, shell results) back into events until the
//! machine reaches `Exit`.

use super::state::{transition, Effect, Event, Outcome, ResolutionState};
use crate::errors::{ClaixError, Result};
use crate::generator::{CommandGenerator, GenerationRequest, PromptKind};
use crate::interaction::{DecisionPrompt, Presenter};
use crate::shell::ShellExecutor;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use std::collections::VecDeque;
use std::time::Instant;

/// Summary of a finished resolution run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionReport {
    pub outcome: Outcome,

    /// Instructions in effect when the run ended
    pub instructions: String,

    /// Generator calls, initial and repair
    pub generations: u32,

    /// Repair generator calls
    pub repairs: u32,

    /// Commands handed to the shell
    pub executions: u32,
}

/// Drives one instruction through propose / decide / run / repair
pub struct Resolver<G, S, P, D>
where
    G: CommandGenerator,
    S: ShellExecutor,
    P: DecisionPrompt,
    D: Presenter,
{
    generator: G,
    shell: S,
    prompt: P,
    presenter: D,
    telemetry: TelemetryCollector,
}

impl<G, S, P, D> Resolver<G, S, P, D>
where
    G: CommandGenerator,
    S: ShellExecutor,
    P: DecisionPrompt,
    D: Presenter,
{
    pub fn new(generator: G, shell: S, prompt: P, presenter: D) -> Self {
        Self {
            generator,
            shell,
            prompt,
            presenter,
            telemetry: TelemetryCollector::new(),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn presenter(&self) -> &D {
        &self.presenter
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Resolve the instructions until the run ends
    ///
    /// Generator and shell failures become outcomes; only prompt I/O errors
    /// and machine misuse are returned as `Err`.
    pub async fn resolve(&mut self, instructions: &str) -> Result<ResolutionReport> {
        let mut state = ResolutionState::new(instructions);
        let mut report = ResolutionReport {
            outcome: Outcome::UserAbort,
            instructions: instructions.to_string(),
            generations: 0,
            repairs: 0,
            executions: 0,
        };

        let mut events = VecDeque::from([Event::Start]);

        while let Some(event) = events.pop_front() {
            let from = state.phase();
            tracing::debug!(phase = from.display_name(), event = event.name(), "transition");

            let step = transition(state, event)?;
            state = step.state;

            if from != state.phase() {
                self.telemetry.record(TelemetryEvent::StateTransition {
                    from: from.display_name().to_string(),
                    to: state.phase().display_name().to_string(),
                    timestamp: Instant::now(),
                });
            }

            for effect in step.effects {
                if let Some(next) = self.perform(effect, &mut report).await? {
                    events.push_back(next);
                }
            }
        }

        let outcome = state.outcome().cloned().ok_or_else(|| ClaixError::InvalidTransition {
            from: format!("{:?}", state.phase()),
            event: "none".to_string(),
            reason: "event queue drained before the run finished".to_string(),
        })?;

        report.outcome = outcome;
        report.instructions = state.instructions().to_string();
        self.telemetry.log_summary();

        Ok(report)
    }

    /// Perform one effect, returning the event it produces (if any)
    async fn perform(
        &mut self,
        effect: Effect,
        report: &mut ResolutionReport,
    ) -> Result<Option<Event>> {
        let event = match effect {
            Effect::Generate(request) => {
                report.generations += 1;
                if request.kind == PromptKind::Repair {
                    report.repairs += 1;
                }
                Some(self.generate(&request).await)
            }
            Effect::ShowProposal { proposal, repair } => {
                self.presenter.show_proposal(&proposal, repair);
                None
            }
            Effect::PromptAction => Some(Event::Decided(self.prompt.choose_action()?)),
            Effect::PromptRevision => {
                self.presenter.show_revision_hint();
                match self.prompt.read_revision()? {
                    Some(text) => Some(Event::Revised(text)),
                    None => Some(Event::Interrupted),
                }
            }
            Effect::ShowExplanation(explanation) => {
                self.presenter.show_explanation(explanation.as_deref());
                Some(Event::Explained)
            }
            Effect::ShowFailure { attempt, stderr } => {
                self.presenter.show_failure(attempt, &stderr);
                None
            }
            Effect::Execute(command) => {
                report.executions += 1;
                Some(self.execute(&command).await)
            }
            Effect::ShowOutput(stdout) => {
                self.presenter.show_output(&stdout);
                None
            }
            Effect::ShowNoOutput => {
                self.presenter.show_no_output();
                None
            }
            Effect::Finish(outcome) => {
                if outcome.is_failure() {
                    tracing::warn!(outcome = %outcome.message(), "resolution ended");
                } else {
                    tracing::info!(outcome = %outcome.message(), "resolution ended");
                }
                self.presenter.show_outcome(&outcome);
                None
            }
        };

        Ok(event)
    }

    async fn generate(&mut self, request: &GenerationRequest) -> Event {
        let started = Instant::now();
        self.presenter.begin_generation(request.kind);
        let result = self.generator.generate(request).await;
        self.presenter.end_generation();

        self.telemetry.record(TelemetryEvent::GenerationCompleted {
            kind: request.kind,
            duration_ms: started.elapsed().as_millis() as u64,
            success: result.is_ok(),
            timestamp: Instant::now(),
        });

        match result {
            Ok(proposal) => Event::Proposed(proposal),
            Err(e) => {
                tracing::error!(error = %e, kind = ?request.kind, "generation failed");
                Event::GenerationFailed(e.to_string())
            }
        }
    }

    async fn execute(&mut self, command: &str) -> Event {
        let started = Instant::now();
        let result = self.shell.execute(command).await;

        match result {
            Ok(result) => {
                self.telemetry.record(TelemetryEvent::CommandExecuted {
                    exit_code: Some(result.exit_code),
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Instant::now(),
                });
                Event::Executed(result)
            }
            Err(e) => {
                self.telemetry.record(TelemetryEvent::CommandExecuted {
                    exit_code: None,
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Instant::now(),
                });
                tracing::error!(error = %e, command, "shell could not run command");
                Event::ExecutionFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Action;
    use crate::types::{CommandProposal, ExecutionResult};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<CommandProposal>>>,
        calls: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<CommandProposal>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandGenerator for ScriptedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<CommandProposal> {
            self.calls.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CommandProposal::unresolved()))
        }
    }

    struct FixedShell(ExecutionResult);

    #[async_trait]
    impl ShellExecutor for FixedShell {
        async fn execute(&self, _command: &str) -> Result<ExecutionResult> {
            Ok(self.0.clone())
        }
    }

    struct ScriptedPrompt(VecDeque<Action>);

    impl DecisionPrompt for ScriptedPrompt {
        fn choose_action(&mut self) -> Result<Action> {
            Ok(self.0.pop_front().unwrap_or(Action::Exit))
        }

        fn read_revision(&mut self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct SilentPresenter {
        outcomes: Vec<Outcome>,
    }

    impl Presenter for SilentPresenter {
        fn begin_generation(&mut self, _kind: PromptKind) {}
        fn end_generation(&mut self) {}
        fn show_proposal(&mut self, _proposal: &CommandProposal, _repair: bool) {}
        fn show_explanation(&mut self, _explanation: Option<&str>) {}
        fn show_revision_hint(&mut self) {}
        fn show_failure(&mut self, _attempt: u32, _stderr: &str) {}
        fn show_output(&mut self, _stdout: &str) {}
        fn show_no_output(&mut self) {}
        fn show_outcome(&mut self, outcome: &Outcome) {
            self.outcomes.push(outcome.clone());
        }
    }

    #[tokio::test]
    async fn test_run_success() {
        let generator = ScriptedGenerator::new(vec![Ok(CommandProposal::command("ls", None))]);
        let shell = FixedShell(ExecutionResult::new(0, "a\nb\n", ""));
        let prompt = ScriptedPrompt(VecDeque::from([Action::Run]));
        let mut resolver = Resolver::new(generator, shell, prompt, SilentPresenter::default());

        let report = resolver.resolve("list files").await.unwrap();

        assert_eq!(report.outcome, Outcome::Succeeded);
        assert_eq!(report.generations, 1);
        assert_eq!(report.repairs, 0);
        assert_eq!(report.executions, 1);
        assert_eq!(resolver.presenter().outcomes, vec![Outcome::Succeeded]);
        assert_eq!(resolver.telemetry().get_stats().executions, 1);
    }

    #[tokio::test]
    async fn test_generation_error_becomes_outcome() {
        let generator =
            ScriptedGenerator::new(vec![Err(ClaixError::Generation("401".to_string()))]);
        let shell = FixedShell(ExecutionResult::new(0, "", ""));
        let prompt = ScriptedPrompt(VecDeque::new());
        let mut resolver = Resolver::new(generator, shell, prompt, SilentPresenter::default());

        let report = resolver.resolve("anything").await.unwrap();

        assert!(matches!(report.outcome, Outcome::GenerationBackendFailure(_)));
        assert_eq!(report.outcome.exit_code(), 1);
        assert_eq!(report.executions, 0);
    }

    #[tokio::test]
    async fn test_repairs_are_bounded() {
        let replies = (0..10)
            .map(|i| Ok(CommandProposal::command(format!("attempt {}", i), None)))
            .collect();
        let generator = ScriptedGenerator::new(replies);
        let shell = FixedShell(ExecutionResult::new(1, "", "nope"));
        let prompt = ScriptedPrompt(VecDeque::from(vec![Action::Run; 10]));
        let mut resolver = Resolver::new(generator, shell, prompt, SilentPresenter::default());

        let report = resolver.resolve("do the thing").await.unwrap();

        assert_eq!(report.outcome, Outcome::RetryBudgetExhausted { attempts: 3 });
        assert_eq!(report.repairs, 3);
        assert_eq!(report.executions, 4);
        assert_eq!(resolver.generator().calls.lock().unwrap().len(), 4);
    }
}
