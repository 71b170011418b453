//! Command resolution: the state machine and the driver that runs it

pub mod orchestrator;
pub mod state;

pub use orchestrator::{ResolutionReport, Resolver};
pub use state::{
    transition, Effect, Event, Outcome, Phase, ResolutionState, Transition, MAX_ERROR_ITERATIONS,
};
