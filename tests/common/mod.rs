// Shared fixtures for integration tests

#![allow(dead_code, reason = "each test binary uses a different subset")]

use rag_lab::Result;
use rag_lab::config::Config;
use rag_lab::embeddings::Embedder;
use rag_lab::generation::Generator;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const HASH_MODEL: &str = "hashed-bag-of-words";
const HASH_DIMENSION: usize = 256;

/// Deterministic bag-of-words embedder: FNV-1a bucketed token counts, L2 normalized
pub struct HashEmbedder;

impl HashEmbedder {
    fn bucket(token: &str) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % HASH_DIMENSION as u64) as usize
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        HASH_MODEL
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; HASH_DIMENSION];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[Self::bucket(&token.to_lowercase())] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}

/// Answers with the first context line and records every prompt
#[derive(Default)]
pub struct ExtractiveGenerator {
    pub prompts: RefCell<Vec<String>>,
}

impl Generator for ExtractiveGenerator {
    fn model_id(&self) -> &str {
        "extractive"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        let answer = prompt
            .split("Context:\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or_default();
        Ok(answer.to_string())
    }
}

/// Lay out `data/<folder>/<name>` files under a fresh base directory
pub fn lab_with_files(files: &[(&str, &str, &str)]) -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    for folder in ["clean_docs", "poisoned_docs"] {
        fs::create_dir_all(temp_dir.path().join("data").join(folder))
            .expect("should create input folder");
    }
    for (folder, name, content) in files {
        write_file(temp_dir.path(), folder, name, content);
    }

    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.embedding.model = HASH_MODEL.to_string();
    (config, temp_dir)
}

pub fn write_file(base: &Path, folder: &str, name: &str, content: &str) {
    fs::write(base.join("data").join(folder).join(name), content).expect("should write file");
}
