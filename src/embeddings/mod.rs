// Embeddings module
// Text -> vector providers used at both ingestion and query time

pub mod ollama;

pub use ollama::OllamaEmbedder;

use crate::Result;

/// Provider interface for embedding generation.
///
/// Stored vectors and query vectors are only comparable when they come from
/// the same `model_id`, which is why the store records it.
pub trait Embedder {
    /// Identity of the model producing the vectors
    fn model_id(&self) -> &str;

    /// Produces an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Produces one vector per input, in input order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    #[inline]
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}
