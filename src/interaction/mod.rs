//! User interaction module
//!
//! Action menu and revision input ([`DecisionPrompt`]) plus rendering
//! ([`Presenter`]). Both are traits so the resolver can be driven by scripted
//! fakes in tests.

pub mod decision;
pub mod display;

pub use decision::{Action, DecisionPrompt, TerminalPrompt};
pub use display::{Presenter, TerminalPresenter};
