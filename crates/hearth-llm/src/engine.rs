//! The generation engine abstraction.

use async_trait::async_trait;

use crate::error::EngineResult;

/// A text-generation backend.
///
/// The router only ever needs single-prompt completion: it sends one
/// prompt string and reads one response string. Keeping the trait this
/// narrow makes scripted test doubles trivial.
#[async_trait]
pub trait TextEngine: Send + Sync {
    /// Generate a completion for one prompt.
    async fn generate(&self, prompt: &str) -> EngineResult<String>;

    /// Name of the model answering.
    fn model_name(&self) -> &str;

    /// Whether the backend is reachable right now.
    async fn is_available(&self) -> bool;
}
