// Loader module
// Reads input folders into whole-file documents; no chunking is performed


use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::{RagError, Result};

/// One input file, loaded whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub source: PathBuf,
    /// Name of the input folder the file came from, e.g. `poisoned_docs`
    pub collection: String,
}

/// Load every file in `dir` whose name ends with `.{extension}`, case-sensitively.
///
/// A file named exactly `.txt` counts. Other entries are skipped. Files are
/// returned in file-name order.
#[inline]
pub fn load_directory(dir: &Path, extension: &str, collection: &str) -> Result<Vec<Document>> {
    debug!("Loading .{} files from {}", extension, dir.display());

    let entries = fs::read_dir(dir).map_err(|e| {
        RagError::Loader(format!("Failed to read directory {}: {}", dir.display(), e))
    })?;

    let suffix = format!(".{}", extension);
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            RagError::Loader(format!(
                "Failed to read entry in {}: {}",
                dir.display(),
                e
            ))
        })?;
        let path = entry.path();

        let matches_suffix = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&suffix));

        if !path.is_file() || !matches_suffix {
            debug!("Skipping {}", path.display());
            continue;
        }

        paths.push(path);
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| load_document(path, collection))
        .collect()
}

/// Load all configured input folders, in configured order
#[inline]
pub fn load_corpus(config: &Config) -> Result<Vec<Document>> {
    let data_dir = config.data_dir_path();
    let mut documents = Vec::new();

    for folder in &config.ingest.folders {
        let loaded = load_directory(&data_dir.join(folder), &config.ingest.extension, folder)?;
        info!("Loaded {} documents from {}", loaded.len(), folder);
        documents.extend(loaded);
    }

    Ok(documents)
}

fn load_document(path: PathBuf, collection: &str) -> Result<Document> {
    let content = fs::read_to_string(&path)
        .map_err(|e| RagError::Loader(format!("Failed to read {}: {}", path.display(), e)))?;

    Ok(Document {
        content,
        source: path,
        collection: collection.to_string(),
    })
}
