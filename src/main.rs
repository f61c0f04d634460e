use clap::{Parser, Subcommand};
use rag_lab::Result;
use rag_lab::commands::{ingest, query};
use rag_lab::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rag-lab")]
#[command(about = "Local RAG lab: ingest clean and poisoned documents, then query them")]
#[command(version)]
struct Cli {
    /// Directory holding rag.toml, the data folders and the vector store
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed every document under data/clean_docs and data/poisoned_docs into the vector store
    Ingest {
        /// Drop existing records before ingesting instead of appending
        #[arg(long)]
        reset: bool,
    },
    /// Answer a question using the top-k retrieved documents as context
    Query {
        /// Question to ask; prompted for interactively when omitted
        question: Option<String>,
        /// Also list the retrieved documents and their distances
        #[arg(long)]
        sources: bool,
    },
    /// Configure Ollama connection and model names
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { reset } => {
            ingest(&cli.base_dir, reset).await?;
        }
        Commands::Query { question, sources } => {
            query(&cli.base_dir, question, sources).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&cli.base_dir)?;
            } else {
                run_interactive_config(&cli.base_dir)?;
            }
        }
    }

    Ok(())
}
