// Generation module
// Prompt -> free-text answer providers

pub mod ollama;

pub use ollama::OllamaGenerator;

use crate::Result;

/// Provider interface for text generation
pub trait Generator {
    fn model_id(&self) -> &str;

    /// Returns the model's response to `prompt` verbatim
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<G: Generator + ?Sized> Generator for &G {
    #[inline]
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    #[inline]
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}
