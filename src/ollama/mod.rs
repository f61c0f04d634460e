
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::OllamaConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Blocking HTTP client for a local Ollama runtime
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check that the server answers and every named model is pulled
    #[inline]
    pub fn health_check(&self, models: &[&str]) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        let available = self.list_models().context("Server ping failed")?;

        for model in models {
            ensure_model_available(&available, model).context("Model validation failed")?;
        }

        info!(
            "Health check passed for Ollama server at {} with models {:?}",
            self.base_url, models
        );
        Ok(())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self.endpoint("/api/tags")?;
        debug!("Pinging Ollama server at {}", url);

        self.make_request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Failed to ping Ollama server")?;

        debug!("Server ping successful");
        Ok(())
    }

    /// Validate that `model` has been pulled into the runtime
    #[inline]
    pub fn validate_model(&self, model: &str) -> Result<()> {
        debug!("Validating model: {}", model);
        let models = self.list_models().context("Failed to list models")?;
        ensure_model_available(&models, model)
    }

    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.endpoint("/api/tags")?;
        debug!("Fetching available models from {}", url);

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .get(url.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to fetch models")?;

        let models_response: ModelsResponse =
            serde_json::from_str(&response_text).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// POST a JSON body to `path` and decode the JSON reply
    #[inline]
    pub fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let request_json = serde_json::to_string(body)
            .with_context(|| format!("Failed to serialize request for {}", path))?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .with_context(|| format!("Request to {} failed", path))?;

        serde_json::from_str(&response_text)
            .with_context(|| format!("Failed to parse response from {}", path))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for {}", path))
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    match &error {
                        ureq::Error::StatusCode(status) if *status >= 500 => {
                            warn!(
                                "Server error (status {}), attempt {}/{}",
                                status, attempt, self.retry_attempts
                            );
                        }
                        ureq::Error::StatusCode(status) => {
                            warn!("Client error (status {}), not retrying", status);
                            return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                        }
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

fn ensure_model_available(models: &[ModelInfo], model: &str) -> Result<()> {
    // Ollama reports untagged pulls as `name:latest`
    let is_match = |candidate: &str| {
        candidate == model
            || (!model.contains(':') && candidate.strip_suffix(":latest") == Some(model))
    };

    if models.iter().any(|m| is_match(&m.name)) {
        debug!("Model {} is available", model);
        return Ok(());
    }

    let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    warn!(
        "Model {} not found. Available models: {:?}",
        model, available_models
    );
    Err(anyhow::anyhow!(
        "Model '{}' is not available. Available models: {:?}",
        model,
        available_models
    ))
}
