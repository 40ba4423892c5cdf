use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quarry_llm::LlmProvider;
use tokio::sync::RwLock;

use crate::backend::{DocsFuture, Retrieval, RetrieverBackend, call_retriever};
use crate::document::Document;
use crate::error::IndexError;
use crate::store::{FlatStore, IndexEntry};

/// Result count used when callers do not pick one.
pub const DEFAULT_K: usize = 4;

/// Native backend over a built [`FlatStore`]: embeds the query, then searches.
struct FlatRetriever<P> {
    store: FlatStore,
    provider: Arc<P>,
}

impl<P: LlmProvider> RetrieverBackend for FlatRetriever<P> {
    fn similarity_search<'a>(
        &'a self,
        query: &'a str,
        k: Option<usize>,
    ) -> Option<DocsFuture<'a>> {
        Some(Box::pin(async move {
            let vector = self.provider.embed(query).await?;
            let hits = self.store.search(&vector, k.unwrap_or(DEFAULT_K))?;
            tracing::trace!(
                top_score = hits.first().map(|h| h.score),
                hits = hits.len(),
                "flat search"
            );
            Ok(hits.into_iter().map(|h| h.document).collect())
        }))
    }
}

struct ActiveIndex {
    backend: Arc<dyn RetrieverBackend>,
    /// `(entries, dimension)` for natively built indexes.
    stats: Option<(usize, usize)>,
}

/// Process-wide document index.
///
/// `build` and `attach` hold the write lock for their whole duration;
/// `retrieve` holds the read lock, so readers never observe a half-built index.
pub struct VectorIndex<P> {
    provider: Arc<P>,
    active: RwLock<Option<ActiveIndex>>,
    generation: AtomicU64,
}

impl<P> fmt::Debug for VectorIndex<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider + 'static> VectorIndex<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            active: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Embed `documents` and replace the current index with them.
    ///
    /// On failure the previous index, if any, stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Build`] if `documents` is empty, an embedding call
    /// fails, or embeddings disagree on dimension.
    pub async fn build(&self, documents: Vec<Document>) -> Result<(), IndexError> {
        if documents.is_empty() {
            return Err(IndexError::build("no documents to index"));
        }

        let mut active = self.active.write().await;
        let started = std::time::Instant::now();

        let mut entries = Vec::with_capacity(documents.len());
        let mut dimension = None;
        for (i, document) in documents.into_iter().enumerate() {
            let embedding = self
                .provider
                .embed(document.content())
                .await
                .map_err(|e| IndexError::build(format!("embedding document {i} failed: {e}")))?;

            let expected = *dimension.get_or_insert(embedding.len());
            if embedding.is_empty() {
                return Err(IndexError::build(format!(
                    "embedding document {i} returned an empty vector"
                )));
            }
            if embedding.len() != expected {
                return Err(IndexError::build(format!(
                    "embedding document {i} has dimension {}, expected {expected}",
                    embedding.len()
                )));
            }
            entries.push(IndexEntry {
                document,
                embedding,
            });
        }

        let store = FlatStore::new(entries, dimension.unwrap_or_default());
        let (count, dimension) = (store.len(), store.dimension());
        *active = Some(ActiveIndex {
            backend: Arc::new(FlatRetriever {
                store,
                provider: Arc::clone(&self.provider),
            }),
            stats: Some((count, dimension)),
        });
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        tracing::info!(
            documents = count,
            dimension,
            generation,
            elapsed_ms = started.elapsed().as_millis(),
            "vector index built"
        );
        Ok(())
    }

    /// Serve retrievals from an external backend instead of a native build.
    pub async fn attach(&self, backend: Arc<dyn RetrieverBackend>) {
        let mut active = self.active.write().await;
        *active = Some(ActiveIndex {
            backend,
            stats: None,
        });
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(generation, "external retriever attached");
    }

    /// Up to `k` documents nearest to `query`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotBuilt`] before the first build,
    /// [`IndexError::InvalidK`] for `k == 0`, and [`IndexError::Retrieval`]
    /// when the backend fails.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, IndexError> {
        self.retrieve_with_shape(query, k)
            .await
            .map(|r| r.documents)
    }

    /// [`Self::retrieve`] with [`DEFAULT_K`].
    ///
    /// # Errors
    ///
    /// See [`Self::retrieve`].
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<Document>, IndexError> {
        self.retrieve(query, DEFAULT_K).await
    }

    /// Like [`Self::retrieve`], also reporting which retriever shape answered.
    ///
    /// # Errors
    ///
    /// See [`Self::retrieve`].
    pub async fn retrieve_with_shape(&self, query: &str, k: usize) -> Result<Retrieval, IndexError> {
        self.retrieve_versioned(query, k).await.map(|(r, _)| r)
    }

    /// Like [`Self::retrieve_with_shape`], also returning the generation of
    /// the index that served the call.
    ///
    /// # Errors
    ///
    /// See [`Self::retrieve`].
    pub async fn retrieve_versioned(
        &self,
        query: &str,
        k: usize,
    ) -> Result<(Retrieval, u64), IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidK);
        }
        let active = self.active.read().await;
        let index = active.as_ref().ok_or(IndexError::NotBuilt)?;
        // Writers bump the generation under the write lock, so it is stable here.
        let generation = self.generation();
        let retrieval = call_retriever(index.backend.as_ref(), query, k).await?;
        tracing::debug!(
            shape = %retrieval.shape,
            k,
            generation,
            returned = retrieval.documents.len(),
            "retrieved documents"
        );
        Ok((retrieval, generation))
    }

    pub async fn is_built(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Number of indexed documents, for natively built indexes.
    pub async fn len(&self) -> Option<usize> {
        self.active
            .read()
            .await
            .as_ref()
            .and_then(|a| a.stats)
            .map(|(len, _)| len)
    }

    /// Embedding dimension fixed at build time, for natively built indexes.
    pub async fn dimension(&self) -> Option<usize> {
        self.active
            .read()
            .await
            .as_ref()
            .and_then(|a| a.stats)
            .map(|(_, dim)| dim)
    }

    /// Incremented by every successful `build` or `attach`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
