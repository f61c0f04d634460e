
use super::{DocumentRecord, MANIFEST_FILE_NAME, SearchHit, StoreManifest};
use crate::config::Config;
use crate::{RagError, Result};
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const TABLE_NAME: &str = "documents";

/// Persistent vector store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    store_dir: PathBuf,
    embedding_model: String,
    manifest: Option<StoreManifest>,
}

impl VectorStore {
    /// Open (or create) the store for appending records embedded by `embedding_model`.
    ///
    /// With `reset`, existing records and the manifest are removed first. An
    /// existing manifest naming a different model is rejected.
    #[inline]
    pub async fn open_for_ingest(
        config: &Config,
        embedding_model: &str,
        reset: bool,
    ) -> Result<Self> {
        let store_dir = config.store_dir_path();
        debug!("Opening vector store for ingestion at {}", store_dir.display());

        fs::create_dir_all(&store_dir).map_err(|e| {
            RagError::Store(format!(
                "Failed to create vector store directory {}: {}",
                store_dir.display(),
                e
            ))
        })?;

        let connection = connect(&store_dir).await?;
        let mut store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            store_dir,
            embedding_model: embedding_model.to_string(),
            manifest: None,
        };

        if reset {
            store.clear().await?;
        }

        store.manifest = read_manifest(&store.store_dir)?;
        let has_table = store.table_exists().await?;
        match &store.manifest {
            Some(manifest) => store.check_model(manifest)?,
            None if has_table => {
                return Err(RagError::Store(format!(
                    "Vector store at {} has records but no {}; re-run ingestion with --reset",
                    store.store_dir.display(),
                    MANIFEST_FILE_NAME
                )));
            }
            None => debug!("Starting a new vector store"),
        }

        info!("Vector store opened for ingestion");
        Ok(store)
    }

    /// Open an existing store for searching with vectors from `config.embedding.model`
    #[inline]
    pub async fn open_for_query(config: &Config) -> Result<Self> {
        let store_dir = config.store_dir_path();
        debug!("Opening vector store for querying at {}", store_dir.display());

        let manifest = read_manifest(&store_dir)?.ok_or_else(|| {
            RagError::Store(format!(
                "No vector store found at {}; run ingestion first",
                store_dir.display()
            ))
        })?;

        let store = Self {
            connection: connect(&store_dir).await?,
            table_name: TABLE_NAME.to_string(),
            store_dir,
            embedding_model: config.embedding.model.clone(),
            manifest: Some(manifest),
        };

        if let Some(manifest) = &store.manifest {
            store.check_model(manifest)?;
        }

        info!("Vector store opened for querying");
        Ok(store)
    }

    #[inline]
    pub fn manifest(&self) -> Option<&StoreManifest> {
        self.manifest.as_ref()
    }

    #[inline]
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    fn check_model(&self, manifest: &StoreManifest) -> Result<()> {
        if manifest.embedding_model != self.embedding_model {
            return Err(RagError::IncompatibleStore {
                stored: manifest.embedding_model.clone(),
                configured: self.embedding_model.clone(),
            });
        }
        Ok(())
    }

    /// Create schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("content", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("collection", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Append records. No de-duplication: re-adding a document stores it twice.
    #[inline]
    pub async fn add_records(&mut self, records: Vec<DocumentRecord>) -> Result<()> {
        let Some(first) = records.first() else {
            debug!("No records to store");
            return Ok(());
        };

        let vector_dim = first.vector.len();
        if vector_dim == 0 {
            return Err(RagError::Store("Cannot store empty vectors".to_string()));
        }
        let expected = self.manifest.as_ref().map_or(vector_dim, |m| m.dimension);
        if let Some(bad) = records.iter().find(|r| r.vector.len() != expected) {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: bad.vector.len(),
            });
        }

        debug!("Storing batch of {} records", records.len());

        if !self.table_exists().await? {
            info!("Creating {} table with {} dimensions", self.table_name, vector_dim);
            self.connection
                .create_empty_table(&self.table_name, Self::create_schema(vector_dim))
                .execute()
                .await
                .map_err(|e| RagError::Store(format!("Failed to create table: {}", e)))?;
        }

        let record_batch = Self::create_record_batch(&records, vector_dim)?;

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("Failed to open table: {}", e)))?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("Failed to insert records: {}", e)))?;

        if self.manifest.is_none() {
            self.manifest = Some(StoreManifest::new(&self.embedding_model, vector_dim));
        }

        info!("Successfully stored {} records", records.len());
        Ok(())
    }

    /// Write the manifest next to the table.
    ///
    /// LanceDB commits every append as a new table version, so the manifest
    /// is the only state left to flush.
    #[inline]
    pub fn persist(&self) -> Result<()> {
        let Some(manifest) = &self.manifest else {
            warn!("Nothing ingested yet, manifest not written");
            return Ok(());
        };

        let path = self.store_dir.join(MANIFEST_FILE_NAME);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(manifest)
            .map_err(|e| RagError::Store(format!("Failed to serialize manifest: {}", e)))?;

        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;

        debug!("Manifest written to {}", path.display());
        Ok(())
    }

    /// Create a RecordBatch from document records
    fn create_record_batch(records: &[DocumentRecord], vector_dim: usize) -> Result<RecordBatch> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);
        let mut contents = Vec::with_capacity(len);
        let mut sources = Vec::with_capacity(len);
        let mut collections = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            contents.push(record.content.as_str());
            sources.push(record.source.as_str());
            collections.push(record.collection.as_str());
            created_ats.push(record.created_at.as_str());
        }

        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            vector_dim as i32,
            Arc::new(Float32Array::from(flat_values)),
            None,
        )
        .map_err(|e| RagError::Store(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(collections)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(Self::create_schema(vector_dim), arrays)
            .map_err(|e| RagError::Store(format!("Failed to create record batch: {}", e)))
    }

    /// Return the `limit` nearest records by L2 distance, closest first
    #[inline]
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        debug!("Searching for similar vectors with limit: {}", limit);

        if let Some(manifest) = &self.manifest {
            if manifest.dimension != query_vector.len() {
                return Err(RagError::DimensionMismatch {
                    expected: manifest.dimension,
                    actual: query_vector.len(),
                });
            }
        }

        if limit == 0 || !self.table_exists().await? {
            return Ok(Vec::new());
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("Failed to open table: {}", e)))?;

        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| RagError::Store(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("Failed to execute search: {}", e)))?;

        let mut hits = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Store(format!("Failed to read result stream: {}", e)))?
        {
            hits.extend(Self::parse_search_batch(&batch)?);
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit);

        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
        let ids = string_column(batch, "id")?;
        let contents = string_column(batch, "content")?;
        let sources = string_column(batch, "source")?;
        let collections = string_column(batch, "collection")?;
        let created_ats = string_column(batch, "created_at")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let hits = (0..batch.num_rows())
            .map(|row| SearchHit {
                id: ids.value(row).to_string(),
                content: contents.value(row).to_string(),
                source: sources.value(row).to_string(),
                collection: collections.value(row).to_string(),
                created_at: created_ats.value(row).to_string(),
                distance: distances
                    .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) }),
            })
            .collect();

        Ok(hits)
    }

    /// Total number of stored records
    #[inline]
    pub async fn count(&self) -> Result<u64> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Store(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Drop all records and forget the manifest
    async fn clear(&mut self) -> Result<()> {
        if self.table_exists().await? {
            info!("Dropping existing {} table", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| RagError::Store(format!("Failed to drop table: {}", e)))?;
        }

        let manifest_path = self.store_dir.join(MANIFEST_FILE_NAME);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }
        self.manifest = None;

        Ok(())
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Store(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }
}

async fn connect(store_dir: &Path) -> Result<Connection> {
    let uri = store_dir.to_string_lossy();
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| RagError::Store(format!("Failed to connect to LanceDB: {}", e)))
}

fn read_manifest(store_dir: &Path) -> Result<Option<StoreManifest>> {
    let path = store_dir.join(MANIFEST_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let manifest = serde_json::from_str(&content).map_err(|e| {
        RagError::Store(format!("Corrupt manifest {}: {}", path.display(), e))
    })?;
    Ok(Some(manifest))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Store(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Store(format!("Invalid {} column type", name)))
}
