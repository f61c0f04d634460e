
use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Input;
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::embeddings::{Embedder, OllamaEmbedder};
use crate::generation::{Generator, OllamaGenerator};
use crate::ingest::{IngestReport, Ingestor};
use crate::query::{Answer, QueryEngine};
use crate::store::VectorStore;

/// Ingest the clean and poisoned folders into the vector store
#[inline]
pub async fn ingest(base_dir: &Path, reset: bool) -> Result<IngestReport> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;
    let embedder = OllamaEmbedder::new(&config)?;

    if let Err(e) = embedder.client().validate_model(embedder.model_id()) {
        warn!("Embedding model check failed: {:#}", e);
    }

    let mut store = VectorStore::open_for_ingest(&config, embedder.model_id(), reset)
        .await
        .context("Failed to open vector store")?;

    let report = Ingestor::new(&config, &embedder)
        .run(&mut store)
        .await
        .context("Ingestion failed")?;

    print!("{}", ingest_summary(&report, store.store_dir()));

    Ok(report)
}

/// Answer one question from the persisted store
#[inline]
pub async fn query(
    base_dir: &Path,
    question: Option<String>,
    show_sources: bool,
) -> Result<Answer> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;

    let store = VectorStore::open_for_query(&config)
        .await
        .context("Failed to open vector store")?;
    let embedder = OllamaEmbedder::new(&config)?;
    let generator = OllamaGenerator::new(&config)?;

    let question = match question {
        Some(question) => question,
        None => prompt_question()?,
    };
    info!("Answering question with {}", generator.model_id());

    let engine = QueryEngine::new(&store, embedder, generator, config.retrieval.top_k);
    let answer = engine
        .answer(&question)
        .await
        .context("Failed to answer question")?;

    if show_sources {
        print_sources(&answer);
    }
    println!("{}", answer_output(&answer.text));

    Ok(answer)
}

fn prompt_question() -> Result<String> {
    if console::user_attended() {
        return Input::new()
            .with_prompt("Enter your question")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read question");
    }

    debug!("stdin is not a terminal, reading the question as a plain line");
    eprint!("Enter your question: ");
    io::stderr().flush().context("Failed to flush prompt")?;
    read_question(io::stdin().lock())
}

/// Read one line, dropping only the line terminator. An empty line is a valid question.
fn read_question<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .context("Failed to read question")?;
    if read == 0 {
        bail!("No question provided: input ended before a line was read");
    }

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}

fn ingest_summary(report: &IngestReport, store_dir: &Path) -> String {
    let mut summary = String::from("✅ Clean + Poisoned documents stored in vector DB\n");
    for (collection, count) in &report.per_collection {
        let _ = writeln!(summary, "   {}: {} documents", collection, count);
    }
    let _ = writeln!(
        summary,
        "   {} records in {}",
        report.total_records,
        store_dir.display()
    );
    summary
}

fn answer_output(text: &str) -> String {
    format!("\n🟢 Answer:\n {}", text)
}

fn print_sources(answer: &Answer) {
    eprintln!("{}", style("📚 Retrieved context").bold().cyan());
    for (rank, hit) in answer.hits.iter().enumerate() {
        eprintln!(
            "  {}. [{}] {} (distance {:.4})",
            rank + 1,
            style(&hit.collection).yellow(),
            hit.source,
            hit.distance
        );
    }
}
