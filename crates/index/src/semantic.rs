//! The semantic index — embedding, search, and paired persistence.
//!
//! `SemanticIndex` owns its embedding provider handle and its in-memory
//! state; it is constructed explicitly and passed around as an `Arc`, no
//! process-wide singleton. The in-memory state is an index+metadata pair
//! published atomically: a rebuild assembles the new pair off-lock and
//! swaps it in whole, so concurrent readers never see a half-built index.
//!
//! On disk the pair lives in two sibling files — the bincode vector
//! structure and a JSON metadata sequence. They are only meaningful
//! together: metadata ordinal N describes vector ordinal N. `load`
//! refuses any pair whose counts disagree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shopclerk_core::{Document, EmbeddingProvider, Hit, IndexError, ProviderError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::flat::{FlatIndex, l2_normalize};

/// The published index+metadata pair. Always swapped as a unit.
struct IndexState {
    index: FlatIndex,
    metadata: Vec<Document>,
}

/// A semantic document index backed by an embedding provider.
pub struct SemanticIndex {
    provider: Arc<dyn EmbeddingProvider>,
    index_path: PathBuf,
    meta_path: PathBuf,
    state: RwLock<Option<IndexState>>,
}

impl SemanticIndex {
    /// Create an unloaded index persisting to the given file pair.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            index_path: index_path.into(),
            meta_path: meta_path.into(),
            state: RwLock::new(None),
        }
    }

    /// Whether a successful `build` or `load` has populated this index.
    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Number of indexed documents (0 when unloaded).
    pub async fn doc_count(&self) -> usize {
        self.state
            .read()
            .await
            .as_ref()
            .map_or(0, |s| s.metadata.len())
    }

    /// Build a fresh index from `documents`, replacing any existing state,
    /// then persist the new pair.
    ///
    /// Fails with [`IndexError::EmptyCorpus`] for an empty input — an
    /// index with zero vectors is not retrievable.
    pub async fn build(&self, documents: Vec<Document>) -> Result<(), IndexError> {
        if documents.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        info!(docs = documents.len(), "building semantic index");

        let mut embeddings = self.provider.encode(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(IndexError::Provider(ProviderError::ApiError {
                status_code: 200,
                message: format!(
                    "expected {} embeddings, got {}",
                    documents.len(),
                    embeddings.len()
                ),
            }));
        }

        for emb in &mut embeddings {
            l2_normalize(emb);
        }

        // Assemble the full replacement pair before taking the lock, then
        // publish it in one swap.
        let index = FlatIndex::from_vectors(embeddings)?;
        let new_state = IndexState {
            index,
            metadata: documents,
        };
        *self.state.write().await = Some(new_state);

        self.persist().await
    }

    /// Write the in-memory pair to the index and metadata files.
    ///
    /// The two writes are coordinated but not atomic together — a crash
    /// in between leaves a mismatched pair on disk, which `load` detects
    /// and rejects (forcing a rebuild) rather than loading silently.
    pub async fn persist(&self) -> Result<(), IndexError> {
        let state = self.state.read().await;
        let state = state.as_ref().ok_or(IndexError::NotLoaded)?;

        for path in [&self.index_path, &self.meta_path] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| IndexError::Persist(format!("create {parent:?}: {e}")))?;
            }
        }

        let index_bytes = bincode::serialize(&state.index)
            .map_err(|e| IndexError::Persist(format!("encode index: {e}")))?;
        std::fs::write(&self.index_path, index_bytes)
            .map_err(|e| IndexError::Persist(format!("write {:?}: {e}", self.index_path)))?;

        let meta_json = serde_json::to_string_pretty(&state.metadata)
            .map_err(|e| IndexError::Persist(format!("encode metadata: {e}")))?;
        std::fs::write(&self.meta_path, meta_json)
            .map_err(|e| IndexError::Persist(format!("write {:?}: {e}", self.meta_path)))?;

        debug!(
            index = %self.index_path.display(),
            meta = %self.meta_path.display(),
            docs = state.metadata.len(),
            "index pair persisted"
        );
        Ok(())
    }

    /// Load the persisted pair, returning `true` on success.
    ///
    /// Populates in-memory state only when both files exist, both parse,
    /// and their counts agree. Every rejection — missing file, corrupt
    /// content, mismatched pair — returns `false` with no partial state;
    /// the caller rebuilds from the corpus.
    pub async fn load(&self) -> bool {
        let index_bytes = match std::fs::read(&self.index_path) {
            Ok(bytes) => bytes,
            Err(_) => {
                debug!(path = %self.index_path.display(), "no index file, skipping load");
                return false;
            }
        };
        let meta_text = match std::fs::read_to_string(&self.meta_path) {
            Ok(text) => text,
            Err(_) => {
                debug!(path = %self.meta_path.display(), "no metadata file, skipping load");
                return false;
            }
        };

        let index: FlatIndex = match bincode::deserialize(&index_bytes) {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "corrupt index file, forcing rebuild");
                return false;
            }
        };
        let metadata: Vec<Document> = match serde_json::from_str(&meta_text) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(error = %e, "corrupt metadata file, forcing rebuild");
                return false;
            }
        };

        // A stale half-written pair is indistinguishable from a valid one
        // without this guard.
        if metadata.len() != index.len() {
            warn!(
                vectors = index.len(),
                metadata = metadata.len(),
                "index/metadata count mismatch, forcing rebuild"
            );
            return false;
        }

        let docs = metadata.len();
        *self.state.write().await = Some(IndexState { index, metadata });
        info!(docs, "semantic index loaded from disk");
        true
    }

    /// Retrieve the top-`k` documents for `query`, best first.
    ///
    /// Each hit carries the inner-product score and the document's stored
    /// fields. Fails with [`IndexError::NotLoaded`] before a successful
    /// `build` or `load`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Hit>, IndexError> {
        // Fail fast before paying for an embedding call.
        if self.state.read().await.is_none() {
            return Err(IndexError::NotLoaded);
        }

        let mut embeddings = self.provider.encode(&[query.to_string()]).await?;
        let mut query_vec = match embeddings.pop() {
            Some(v) if embeddings.is_empty() => v,
            _ => {
                return Err(IndexError::Provider(ProviderError::ApiError {
                    status_code: 200,
                    message: "expected exactly one query embedding".into(),
                }));
            }
        };
        l2_normalize(&mut query_vec);

        let state = self.state.read().await;
        let state = state.as_ref().ok_or(IndexError::NotLoaded)?;

        let hits = state
            .index
            .search(&query_vec, k)?
            .into_iter()
            .map(|(ordinal, score)| Hit {
                score,
                document: state.metadata[ordinal].clone(),
            })
            .collect();
        Ok(hits)
    }

    /// The on-disk index file path.
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// The on-disk metadata file path.
    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }
}
