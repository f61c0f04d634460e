#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Embedder;
use crate::config::Config;
use crate::ollama::OllamaClient;
use crate::{RagError, Result};

/// Embedding provider backed by Ollama's `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let client = OllamaClient::new(&config.ollama)
            .map_err(|e| RagError::Config(format!("Failed to create Ollama client: {:#}", e)))?;
        Ok(Self::with_client(client, config.embedding.model.clone()))
    }

    #[inline]
    pub fn with_client(client: OllamaClient, model: String) -> Self {
        Self { client, model }
    }

    #[inline]
    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response: EmbedResponse = self
            .client
            .post_json("/api/embed", &request)
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

        if response.embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }
}

impl Embedder for OllamaEmbedder {
    #[inline]
    fn model_id(&self) -> &str {
        &self.model
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let mut vectors = self.request_embeddings(&[text.to_string()])?;
        let vector = vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("Empty embedding response".to_string()))?;

        debug!("Generated embedding with {} dimensions", vector.len());
        Ok(vector)
    }

    /// Embed `texts` in a single `/api/embed` request; callers size the batch
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());
        self.request_embeddings(texts)
    }
}
