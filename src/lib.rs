use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Loader error: {0}")]
    Loader(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error(
        "Vector store was built with embedding model '{stored}' but '{configured}' is configured; re-run ingestion with --reset"
    )]
    IncompatibleStore { stored: String, configured: String },

    #[error("Embedding dimension mismatch: store expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod ingest;
pub mod loader;
pub mod ollama;
pub mod query;
pub mod store;
