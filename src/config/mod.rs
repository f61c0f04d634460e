// Configuration management module
// Everything the ingestor and query engine need is passed through `Config`

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CONFIG_FILE_NAME, Config, ConfigError, EmbeddingConfig, GenerationConfig, IngestConfig,
    OllamaConfig, RetrievalConfig, StoreConfig,
};
