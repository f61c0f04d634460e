// Vector store module
// LanceDB table of ingested documents plus a manifest tagging the embedding model

pub mod vector_store;

pub use vector_store::VectorStore;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::loader::Document;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Document record stored in LanceDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub vector: Vec<f32>,
    /// Full text of the source file
    pub content: String,
    pub source: String,
    pub collection: String,
    pub created_at: String,
}

impl DocumentRecord {
    #[inline]
    pub fn new(document: &Document, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            content: document.content.clone(),
            source: document.source.display().to_string(),
            collection: document.collection.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A stored document returned by similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub source: String,
    pub collection: String,
    pub created_at: String,
    /// Distance to the query vector; lower is closer
    pub distance: f32,
}

/// Identity of the embedding configuration a store was built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub embedding_model: String,
    pub dimension: usize,
    pub created_at: String,
}

impl StoreManifest {
    #[inline]
    pub fn new(embedding_model: &str, dimension: usize) -> Self {
        Self {
            embedding_model: embedding_model.to_string(),
            dimension,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
