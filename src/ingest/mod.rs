// Ingest module
// Load -> embed -> append -> persist, strictly in that order

#[cfg(test)]
mod tests;

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::loader::{Document, load_corpus};
use crate::store::{DocumentRecord, VectorStore};
use crate::{RagError, Result};

/// Outcome of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub documents_ingested: usize,
    /// Documents ingested per input folder
    pub per_collection: BTreeMap<String, usize>,
    /// Records in the store after this run, including earlier runs
    pub total_records: u64,
    pub duration: Duration,
}

pub struct Ingestor<'a, E> {
    config: &'a Config,
    embedder: E,
}

impl<'a, E: Embedder> Ingestor<'a, E> {
    #[inline]
    pub fn new(config: &'a Config, embedder: E) -> Self {
        Self { config, embedder }
    }

    /// Ingest every eligible file into `store` and persist it.
    ///
    /// Nothing is written until every document has been embedded.
    #[inline]
    pub async fn run(&self, store: &mut VectorStore) -> Result<IngestReport> {
        let started = Instant::now();

        let documents = load_corpus(self.config)?;
        info!("Loaded {} documents", documents.len());

        let vectors = self.embed_documents(&documents)?;

        let mut per_collection = BTreeMap::new();
        let records: Vec<DocumentRecord> = documents
            .iter()
            .zip(vectors)
            .map(|(document, vector)| {
                *per_collection
                    .entry(document.collection.clone())
                    .or_insert(0) += 1;
                DocumentRecord::new(document, vector)
            })
            .collect();

        let documents_ingested = records.len();
        store.add_records(records).await?;
        store.persist()?;

        let total_records = store.count().await?;
        let report = IngestReport {
            documents_ingested,
            per_collection,
            total_records,
            duration: started.elapsed(),
        };

        info!(
            "Ingested {} documents in {:?} ({} records in store)",
            report.documents_ingested, report.duration, report.total_records
        );
        Ok(report)
    }

    fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.config.embedding.batch_size.max(1) as usize;
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();

        let bar = if console::user_attended_stderr() {
            ProgressBar::new(texts.len() as u64).with_style(
                ProgressStyle::with_template("{bar:30} [{pos}/{len}] Embedding documents")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        };

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size) {
            debug!("Embedding batch of {} documents", chunk.len());
            vectors.extend(self.embedder.embed_batch(chunk)?);
            bar.inc(chunk.len() as u64);
        }
        bar.finish_and_clear();

        if vectors.len() != documents.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                documents.len(),
                vectors.len()
            )));
        }

        Ok(vectors)
    }
}
