
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const CONFIG_FILE_NAME: &str = "rag.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Connection to the local Ollama runtime serving both models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model tag; also recorded in the store manifest
    pub model: String,
    pub batch_size: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-minilm:l6-v2".to_string(),
            batch_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2:3b".to_string(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    /// Input folders under `data_dir`, loaded in this order
    pub folders: Vec<String>,
    /// File extension without the leading dot
    pub extension: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            folders: vec!["clean_docs".to_string(), "poisoned_docs".to_string()],
            extension: "txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("vectorstore"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("At least one input folder must be configured")]
    NoInputFolders,
    #[error("File extension cannot be empty")]
    EmptyExtension,

    #[error("File extension must not start with a dot: {0}")]
    DottedExtension(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load `rag.toml` from `base_dir`, falling back to defaults when it is absent
    #[inline]
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(Self {
                base_dir: base_dir.to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = base_dir.to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!("Failed to create config directory: {}", self.base_dir.display())
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;
        self.embedding.validate()?;
        self.generation.validate()?;
        self.ingest.validate()?;

        if !(1..=100).contains(&self.retrieval.top_k) {
            return Err(ConfigError::InvalidTopK(self.retrieval.top_k));
        }

        Ok(())
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        self.ollama.ollama_url()
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// Directory holding the input folders
    #[inline]
    pub fn data_dir_path(&self) -> PathBuf {
        self.base_dir.join(&self.ingest.data_dir)
    }

    /// Directory holding the persisted vector store
    #[inline]
    pub fn store_dir_path(&self) -> PathBuf {
        self.base_dir.join(&self.store.dir)
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        self.ollama_url()?;
        Ok(())
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = OllamaConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_model_name(&self.model)?;

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        validate_model_name(&model)?;
        self.model = model;
        Ok(())
    }

    pub fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_model_name(&self.model)?;

        match self.temperature {
            Some(temperature) if !(0.0..=2.0).contains(&temperature) => {
                Err(ConfigError::InvalidTemperature(temperature))
            }
            _ => Ok(()),
        }
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        validate_model_name(&model)?;
        self.model = model;
        Ok(())
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.folders.is_empty() {
            return Err(ConfigError::NoInputFolders);
        }

        if self.extension.trim().is_empty() {
            return Err(ConfigError::EmptyExtension);
        }

        if self.extension.starts_with('.') {
            return Err(ConfigError::DottedExtension(self.extension.clone()));
        }

        Ok(())
    }
}

fn validate_model_name(model: &str) -> Result<(), ConfigError> {
    if model.trim().is_empty() {
        return Err(ConfigError::InvalidModel(model.to_string()));
    }
    Ok(())
}
