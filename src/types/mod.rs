//! Type definitions module
//!
//! Values exchanged between the resolver and its collaborators.

pub mod proposal;
pub use proposal::{CommandProposal, RawProposal, UNRESOLVED_SENTINEL};

// Shell execution result types
pub mod execution;
pub use execution::{ExecutionResult, NO_EXIT_CODE};
