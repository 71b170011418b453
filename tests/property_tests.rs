//! Property tests for proposal normalization and the repair bound

use claix::generator::PromptKind;
use claix::interaction::Action;
use claix::resolver::{transition, Effect, Event, ResolutionState, MAX_ERROR_ITERATIONS};
use claix::types::{CommandProposal, ExecutionResult, RawProposal};
use quickcheck_macros::quickcheck;

#[quickcheck]
fn normalized_proposal_never_runs_blank_command(
    is_command: Option<bool>,
    command: Option<String>,
    explanation: Option<String>,
) -> bool {
    let blank = command
        .as_deref()
        .map(|c| c.trim().is_empty() || c.trim() == ".")
        .unwrap_or(true);

    let proposal = RawProposal {
        is_command,
        command,
        explanation,
    }
    .normalize();

    match proposal.runnable() {
        Some(cmd) => !blank && !cmd.trim().is_empty() && cmd == cmd.trim(),
        None => !proposal.is_command,
    }
}

#[quickcheck]
fn refused_proposal_is_never_runnable(command: String) -> bool {
    let proposal = RawProposal {
        is_command: Some(false),
        command: Some(command),
        explanation: None,
    }
    .normalize();

    proposal.runnable().is_none()
}

fn to_action(choice: u8) -> Action {
    match choice % 4 {
        0 => Action::Run,
        1 => Action::Revise,
        2 => Action::Explain,
        _ => Action::Exit,
    }
}

/// Drive the machine synchronously with scripted answers and return the
/// longest run of consecutive repair generations
fn longest_repair_streak(choices: Vec<u8>, run_succeeds: Vec<bool>) -> u32 {
    let mut state = ResolutionState::new("do the thing");
    let mut pending = vec![Event::Start];
    let mut choices = choices.into_iter();
    let mut runs = run_succeeds.into_iter();
    let mut generated = 0;
    let mut streak = 0;
    let mut longest = 0;

    while let Some(event) = pending.pop() {
        let step = transition(state, event).unwrap();
        state = step.state;

        for effect in step.effects {
            let next = match effect {
                Effect::Generate(request) => {
                    if request.kind == PromptKind::Repair {
                        streak += 1;
                        longest = longest.max(streak);
                    } else {
                        streak = 0;
                    }
                    generated += 1;
                    Some(Event::Proposed(CommandProposal::command(
                        format!("cmd{}", generated),
                        None,
                    )))
                }
                Effect::PromptAction => {
                    let action = choices.next().map(to_action).unwrap_or(Action::Exit);
                    Some(Event::Decided(action))
                }
                Effect::PromptRevision => Some(Event::Revised("try again".to_string())),
                Effect::ShowExplanation(_) => Some(Event::Explained),
                Effect::Execute(_) => {
                    let ok = runs.next().unwrap_or(false);
                    let code = if ok { 0 } else { 1 };
                    Some(Event::Executed(ExecutionResult::new(code, "", "err")))
                }
                _ => None,
            };
            if let Some(next) = next {
                pending.push(next);
            }
        }
    }

    assert!(state.is_terminal());
    longest
}

#[quickcheck]
fn repair_generations_are_bounded(choices: Vec<u8>, run_succeeds: Vec<bool>) -> bool {
    longest_repair_streak(choices, run_succeeds) <= MAX_ERROR_ITERATIONS
}

#[quickcheck]
fn repairs_track_consecutive_failures(failures: u8) -> bool {
    let failures = (failures % 8) as usize;
    let mut runs = vec![false; failures];
    runs.push(true);

    let streak = longest_repair_streak(vec![0u8; 16], runs);
    streak == (failures as u32).min(MAX_ERROR_ITERATIONS)
}
