//! External text-generation capability
//!
//! The repair pass talks to a provider only through [`TextGenerator`]. The
//! capability is injected, never looked up globally, so the whole pipeline
//! runs against a fake in tests.

use crate::error::GenerationError;
use async_trait::async_trait;
use std::sync::Arc;

/// Opaque `generate(prompt) -> text` capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Produce text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for Arc<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt).await
    }
}

/// Shared handle to a generator
pub type SharedGenerator = Arc<dyn TextGenerator>;
