use super::*;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Embeds text as (length, vowel count, 1.0)
struct ShapeEmbedder {
    calls: Cell<usize>,
    batches: RefCell<Vec<usize>>,
}

impl ShapeEmbedder {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
            batches: RefCell::new(Vec::new()),
        }
    }
}

impl Embedder for ShapeEmbedder {
    fn model_id(&self) -> &str {
        "shape"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.set(self.calls.get() + 1);
        let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
        Ok(vec![text.len() as f32, vowels as f32, 1.0])
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.borrow_mut().push(texts.len());
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "shape"
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding("connection refused".to_string()))
    }
}

fn write_corpus(base: &Path, clean: &[&str], poisoned: &[&str]) {
    for (folder, texts) in [("clean_docs", clean), ("poisoned_docs", poisoned)] {
        let dir = base.join("data").join(folder);
        fs::create_dir_all(&dir).expect("should create folder");
        for (i, text) in texts.iter().enumerate() {
            fs::write(dir.join(format!("doc_{}.txt", i)), text).expect("should write doc");
        }
    }
}

fn test_config(temp_dir: &TempDir, batch_size: u32) -> Config {
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.embedding.batch_size = batch_size;
    config
}

#[tokio::test]
async fn ingests_one_record_per_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    write_corpus(
        temp_dir.path(),
        &["The sky is blue.", "Water is wet."],
        &["The sky is green."],
    );
    fs::write(temp_dir.path().join("data/clean_docs/readme.md"), "skip me")
        .expect("should write");
    let config = test_config(&temp_dir, 2);

    let embedder = ShapeEmbedder::new();
    let mut store = VectorStore::open_for_ingest(&config, embedder.model_id(), false)
        .await
        .expect("should open store");
    let report = Ingestor::new(&config, &embedder)
        .run(&mut store)
        .await
        .expect("ingestion should succeed");

    assert_eq!(report.documents_ingested, 3);
    assert_eq!(report.total_records, 3);
    assert_eq!(report.per_collection.get("clean_docs"), Some(&2));
    assert_eq!(report.per_collection.get("poisoned_docs"), Some(&1));
    assert_eq!(embedder.calls.get(), 3);
    assert_eq!(store.manifest().map(|m| m.dimension), Some(3));
}

#[tokio::test]
async fn rerun_appends_duplicates() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    write_corpus(temp_dir.path(), &["alpha", "beta"], &["gamma"]);
    let config = test_config(&temp_dir, 16);

    for expected in [3, 6] {
        let mut store = VectorStore::open_for_ingest(&config, "shape", false)
            .await
            .expect("should open store");
        let report = Ingestor::new(&config, ShapeEmbedder::new())
            .run(&mut store)
            .await
            .expect("ingestion should succeed");
        assert_eq!(report.documents_ingested, 3);
        assert_eq!(report.total_records, expected);
    }
}

#[tokio::test]
async fn embedding_failure_leaves_store_untouched() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    write_corpus(temp_dir.path(), &["alpha"], &["beta"]);
    let config = test_config(&temp_dir, 16);

    let mut store = VectorStore::open_for_ingest(&config, "shape", false)
        .await
        .expect("should open store");
    let result = Ingestor::new(&config, FailingEmbedder)
        .run(&mut store)
        .await;

    assert!(matches!(result, Err(RagError::Embedding(_))));
    assert_eq!(store.count().await.expect("should count"), 0);
    assert!(store.manifest().is_none());
}

#[tokio::test]
async fn missing_input_folder_is_an_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::create_dir_all(temp_dir.path().join("data/clean_docs")).expect("should create dir");
    let config = test_config(&temp_dir, 16);

    let mut store = VectorStore::open_for_ingest(&config, "shape", false)
        .await
        .expect("should open store");
    let result = Ingestor::new(&config, ShapeEmbedder::new())
        .run(&mut store)
        .await;

    assert!(matches!(result, Err(RagError::Loader(_))));
}

#[tokio::test]
async fn empty_corpus_stores_nothing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    write_corpus(temp_dir.path(), &[], &[]);
    let config = test_config(&temp_dir, 16);

    let mut store = VectorStore::open_for_ingest(&config, "shape", false)
        .await
        .expect("should open store");
    let report = Ingestor::new(&config, ShapeEmbedder::new())
        .run(&mut store)
        .await
        .expect("ingestion should succeed");

    assert_eq!(report.documents_ingested, 0);
    assert_eq!(report.total_records, 0);
    assert!(report.per_collection.is_empty());
}

#[tokio::test]
async fn embedder_sees_one_call_per_configured_batch() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    write_corpus(
        temp_dir.path(),
        &["one", "two", "three"],
        &["four", "five"],
    );
    let config = test_config(&temp_dir, 2);

    let embedder = ShapeEmbedder::new();
    let mut store = VectorStore::open_for_ingest(&config, embedder.model_id(), false)
        .await
        .expect("should open store");
    Ingestor::new(&config, &embedder)
        .run(&mut store)
        .await
        .expect("ingestion should succeed");

    assert_eq!(*embedder.batches.borrow(), vec![2, 2, 1]);
    assert_eq!(embedder.calls.get(), 5);
}
