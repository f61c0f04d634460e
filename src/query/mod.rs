// Query module
// Embed the question, retrieve top-k, build the prompt, generate


use itertools::Itertools;
use tracing::{debug, info};

use crate::Result;
use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::store::{SearchHit, VectorStore};

/// Answer to one question together with what produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Raw model response
    pub text: String,
    /// Retrieved documents, closest first
    pub hits: Vec<SearchHit>,
    pub prompt: String,
}

/// Join retrieved document texts with newlines, in rank order
#[inline]
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter().map(|hit| hit.content.as_str()).join("\n")
}

#[inline]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "\nAnswer the question using only the context below.\n\nContext:\n{context}\n\nQuestion:\n{question}\n"
    )
}

pub struct QueryEngine<'a, E, G> {
    store: &'a VectorStore,
    embedder: E,
    generator: G,
    top_k: usize,
}

impl<'a, E: Embedder, G: Generator> QueryEngine<'a, E, G> {
    #[inline]
    pub fn new(store: &'a VectorStore, embedder: E, generator: G, top_k: usize) -> Self {
        Self {
            store,
            embedder,
            generator,
            top_k,
        }
    }

    /// Embed `question` as-is and return the `top_k` nearest documents
    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>> {
        let query_vector = self.embedder.embed(question)?;
        let hits = self.store.search(&query_vector, self.top_k).await?;

        debug!(
            "Retrieved {} documents: {:?}",
            hits.len(),
            hits.iter().map(|h| h.source.as_str()).collect::<Vec<_>>()
        );
        Ok(hits)
    }

    #[inline]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let hits = self.retrieve(question).await?;
        let context = build_context(&hits);
        let prompt = build_prompt(&context, question);

        info!(
            "Asking {} with {} context documents",
            self.generator.model_id(),
            hits.len()
        );
        let text = self.generator.generate(&prompt)?;

        Ok(Answer { text, hits, prompt })
    }
}
