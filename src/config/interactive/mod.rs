#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;
use std::time::Duration;

use super::{Config, ConfigError, OllamaConfig};
use crate::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config(base_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 RAG Lab Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(base_dir)?;

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Both the embedding model and the generation model are served by Ollama.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;
    configure_models(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before ingesting.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    match config.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Embedding Model: {}", style(&config.embedding.model).cyan());
    eprintln!(
        "  Embedding Batch Size: {}",
        style(config.embedding.batch_size).cyan()
    );
    eprintln!("  Generation Model: {}", style(&config.generation.model).cyan());
    if let Some(temperature) = config.generation.temperature {
        eprintln!("  Temperature: {}", style(temperature).cyan());
    }

    eprintln!();
    eprintln!("{}", style("Pipeline Settings:").bold().yellow());
    eprintln!(
        "  Data Directory: {}",
        style(config.data_dir_path().display()).cyan()
    );
    eprintln!(
        "  Input Folders: {}",
        style(config.ingest.folders.join(", ")).cyan()
    );
    eprintln!("  Extension: .{}", style(&config.ingest.extension).cyan());
    eprintln!(
        "  Vector Store: {}",
        style(config.store_dir_path().display()).cyan()
    );
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(base_dir: &Path) -> Result<Config> {
    Config::load(base_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: base_dir.to_path_buf(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;

    Ok(())
}

fn configure_models(config: &mut Config) -> Result<()> {
    let embedding_model: String = Input::new()
        .with_prompt("Embedding model (changing it requires re-ingesting)")
        .default(config.embedding.model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(config.embedding.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let generation_model: String = Input::new()
        .with_prompt("Generation model")
        .default(config.generation.model.clone())
        .validate_with(non_empty)
        .interact_text()?;

    config.embedding.set_model(embedding_model)?;
    config.embedding.set_batch_size(batch_size)?;
    config.generation.set_model(generation_model)?;

    Ok(())
}

fn non_empty(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Model name cannot be empty")
    } else {
        Ok(())
    }
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    OllamaClient::new(ollama)
        .map(|client| {
            client
                .with_timeout(Duration::from_secs(5))
                .with_retry_attempts(1)
        })
        .and_then(|client| client.ping())
        .is_ok()
}
