//! Command generation module
//!
//! Maps prompts to [`CommandProposal`]s through the OpenAI Assistants API.

pub mod client;
pub mod prompts;

use crate::errors::Result;
use crate::types::CommandProposal;
use async_trait::async_trait;

// Re-export commonly used types
pub use client::{AssistantClient, AssistantGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use prompts::{GenerationRequest, PromptKind};

/// Anything that can turn a prompt into a command proposal
#[async_trait]
pub trait CommandGenerator: Send + Sync {
    /// Generate a normalized proposal; errors are backend failures
    async fn generate(&self, request: &GenerationRequest) -> Result<CommandProposal>;
}
