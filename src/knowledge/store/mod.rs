
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::embeddings::EmbeddingProvider;
use crate::knowledge::index::VectorIndex;
use crate::{GatewayError, Result};

const DOCUMENTS_FILE: &str = "documents.json";
const VECTORS_FILE: &str = "vectors.bin";
const INDEX_FILE: &str = "index.bin";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreStats {
    pub total_documents: usize,
    pub total_characters: usize,
    pub categories: BTreeMap<String, usize>,
    pub has_vector_index: bool,
    pub index_dimension: Option<usize>,
}

/// Embedding matrix and index for the current document set, swapped in as
/// one unit so readers never observe a partial rebuild.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchState {
    pub vectors: Vec<Vec<f32>>,
    pub index: VectorIndex,
}

/// Ordered collection of documents plus their derived vectors and index.
///
/// Read-heavy, rare-writer: searches take a cheap snapshot; `add`/`rebuild`
/// compute fresh vectors and a fresh index without holding any reader lock
/// and swap them in atomically. Writers serialize on a rebuild mutex.
///
/// Persists three artifacts under the store root: `documents.json` (source
/// of truth), `vectors.bin`, and `index.bin`. The derived artifacts are
/// regenerable from the documents alone; losing them degrades search until
/// the next rebuild but never loses data.
pub struct DocumentStore {
    root: PathBuf,
    documents: RwLock<Vec<Document>>,
    search_state: RwLock<Option<Arc<SearchState>>>,
    rebuild_lock: Mutex<()>,
}

impl DocumentStore {
    /// Open a store at `root`, reconstructing in-memory state from whatever
    /// artifacts read cleanly. Unreadable derived artifacts are dropped with
    /// a warning; a missing root starts a fresh store.
    #[inline]
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            GatewayError::Persistence(format!(
                "Failed to create knowledge base directory {}: {}",
                root.display(),
                e
            ))
        })?;

        let documents = load_documents(&root);
        let search_state = load_search_state(&root, documents.len());

        if !documents.is_empty() {
            info!(
                "Loaded knowledge base with {} documents (index: {})",
                documents.len(),
                if search_state.is_some() { "ready" } else { "absent" },
            );
        }

        Ok(Self {
            root,
            documents: RwLock::new(documents),
            search_state: RwLock::new(search_state.map(Arc::new)),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Add a document and rebuild vectors and index for the whole set.
    ///
    /// No incremental re-embedding is attempted; at the target scale of
    /// thousands of documents a full rebuild is cheap enough.
    #[inline]
    pub fn add(
        &self,
        provider: &EmbeddingProvider,
        content: String,
        title: String,
        category: String,
        tags: Vec<String>,
    ) -> Result<String> {
        let document = {
            let mut documents = write_lock(&self.documents);
            let document = Document {
                id: format!(
                    "doc_{}_{}",
                    documents.len(),
                    Utc::now().format("%Y%m%d_%H%M%S")
                ),
                title,
                content,
                category,
                tags,
                created_at: Utc::now(),
            };
            documents.push(document.clone());
            document
        };

        debug!("Added document {}", document.id);

        self.rebuild(provider)?;

        if let Err(e) = self.persist() {
            error!("Failed to persist knowledge base: {}", e);
        }

        Ok(document.id)
    }

    /// Re-embed every document and swap in a fresh index.
    ///
    /// Embedding and index construction happen outside any lock readers
    /// take; the swap itself is a short write-lock section.
    #[inline]
    pub fn rebuild(&self, provider: &EmbeddingProvider) -> Result<()> {
        let _guard = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let texts: Vec<String> = read_lock(&self.documents)
            .iter()
            .map(|doc| doc.content.clone())
            .collect();

        if texts.is_empty() {
            *write_lock(&self.search_state) = None;
            return Ok(());
        }

        let batch = provider.embed(&texts);
        debug!(
            "Embedded {} documents via '{}' tier",
            batch.vectors.len(),
            batch.tier
        );

        match VectorIndex::build(&batch.vectors) {
            Ok(index) => {
                info!(
                    "Built vector index over {} documents ({} dimensions)",
                    index.len(),
                    index.dimension()
                );
                *write_lock(&self.search_state) = Some(Arc::new(SearchState {
                    vectors: batch.vectors,
                    index,
                }));
            }
            Err(e) => {
                warn!("Index build failed: {}, search will use lexical scoring", e);
                *write_lock(&self.search_state) = None;
            }
        }

        Ok(())
    }

    /// Snapshot of all documents in insertion order.
    #[inline]
    pub fn documents(&self) -> Vec<Document> {
        read_lock(&self.documents).clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        read_lock(&self.documents).len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current index snapshot, if one has been built.
    #[inline]
    pub fn search_state(&self) -> Option<Arc<SearchState>> {
        read_lock(&self.search_state).clone()
    }

    #[inline]
    pub fn stats(&self) -> StoreStats {
        let documents = read_lock(&self.documents);
        let state = self.search_state();

        let mut categories = BTreeMap::new();
        let mut total_characters = 0;
        for doc in documents.iter() {
            *categories.entry(doc.category.clone()).or_insert(0) += 1;
            total_characters += doc.content.chars().count();
        }

        StoreStats {
            total_documents: documents.len(),
            total_characters,
            categories,
            has_vector_index: state.is_some(),
            index_dimension: state.map(|s| s.index.dimension()),
        }
    }

    /// Write the three artifacts to the store root.
    #[inline]
    pub fn persist(&self) -> Result<()> {
        let documents = self.documents();
        let state = self.search_state();

        let docs_json = serde_json::to_string_pretty(&documents)
            .map_err(|e| GatewayError::Persistence(format!("Failed to encode documents: {}", e)))?;
        fs::write(self.root.join(DOCUMENTS_FILE), docs_json).map_err(|e| {
            GatewayError::Persistence(format!("Failed to write document records: {}", e))
        })?;

        if let Some(state) = state {
            let vectors = bincode::serialize(&state.vectors)
                .map_err(|e| GatewayError::Persistence(format!("Failed to encode vectors: {}", e)))?;
            fs::write(self.root.join(VECTORS_FILE), vectors).map_err(|e| {
                GatewayError::Persistence(format!("Failed to write vector artifact: {}", e))
            })?;

            let index = bincode::serialize(&state.index)
                .map_err(|e| GatewayError::Persistence(format!("Failed to encode index: {}", e)))?;
            fs::write(self.root.join(INDEX_FILE), index).map_err(|e| {
                GatewayError::Persistence(format!("Failed to write index artifact: {}", e))
            })?;
        }

        debug!("Knowledge base persisted to {}", self.root.display());
        Ok(())
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn load_documents(root: &Path) -> Vec<Document> {
    let path = root.join(DOCUMENTS_FILE);
    if !path.exists() {
        return Vec::new();
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(documents) => documents,
            Err(e) => {
                error!("Failed to parse document records, starting fresh: {}", e);
                Vec::new()
            }
        },
        Err(e) => {
            error!("Failed to read document records, starting fresh: {}", e);
            Vec::new()
        }
    }
}

fn load_search_state(root: &Path, document_count: usize) -> Option<SearchState> {
    if document_count == 0 {
        return None;
    }

    let vectors: Vec<Vec<f32>> = read_artifact(&root.join(VECTORS_FILE))?;
    let index: VectorIndex = read_artifact(&root.join(INDEX_FILE))?;

    if vectors.len() != document_count || index.len() != document_count {
        warn!(
            "Derived artifacts disagree with document count ({} vectors, {} indexed, {} documents), discarding",
            vectors.len(),
            index.len(),
            document_count
        );
        return None;
    }

    Some(SearchState { vectors, index })
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        debug!("Artifact missing: {}", path.display());
        return None;
    }

    match fs::read(path) {
        Ok(bytes) => match bincode::deserialize(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to decode artifact {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read artifact {}: {}", path.display(), e);
            None
        }
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
