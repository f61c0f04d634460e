
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Generator;
use crate::config::Config;
use crate::ollama::OllamaClient;
use crate::{RagError, Result};

/// Non-streaming completion against Ollama's `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

impl OllamaGenerator {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let client = OllamaClient::new(&config.ollama)
            .map_err(|e| RagError::Config(format!("Failed to create Ollama client: {:#}", e)))?;
        Ok(Self::with_client(
            client,
            config.generation.model.clone(),
            config.generation.temperature,
        ))
    }

    #[inline]
    pub fn with_client(client: OllamaClient, model: String, temperature: Option<f32>) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }
}

impl Generator for OllamaGenerator {
    #[inline]
    fn model_id(&self) -> &str {
        &self.model
    }

    #[inline]
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            "Generating response with {} (prompt length: {})",
            self.model,
            prompt.len()
        );

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self
                .temperature
                .map(|temperature| GenerateOptions { temperature }),
        };

        let response: GenerateResponse = self
            .client
            .post_json("/api/generate", &request)
            .map_err(|e| RagError::Generation(format!("{:#}", e)))?;

        debug!(
            "Generated {} characters ({:?} tokens)",
            response.response.len(),
            response.eval_count
        );
        Ok(response.response)
    }
}
