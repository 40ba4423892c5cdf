//! Retriever compatibility shim.
//!
//! Retrieval backends expose "fetch nearest documents" under different shapes:
//! some take only a query, some also take a count, some only reach documents
//! through an underlying index. A backend advertises a shape by returning
//! `Some` from the matching method. [`call_retriever`] walks
//! [`RetrieverShape::PROBE_ORDER`] and uses the first shape the backend
//! exposes, so the winner is fixed when several shapes are present.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::document::Document;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type DocsFuture<'a> = BoxFuture<'a, Result<Vec<Document>, BackendError>>;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The method exists but does not accept a result count.
    #[error("retriever does not accept a result count")]
    ArityMismatch,

    #[error("no supported retrieval method found on retriever or underlying index")]
    NoSupportedMethod,

    #[error("query embedding failed: {0}")]
    Embedding(#[from] quarry_llm::LlmError),

    #[error("query embedding has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("search failed: {0}")]
    Search(String),
}

/// Retrieval method shapes, listed in probe priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrieverShape {
    /// `relevant_documents(query)`
    RelevantDocuments,
    /// `retrieve(query, k)`, falling back to `retrieve(query)`
    Retrieve,
    /// `get_documents(query)`
    GetDocuments,
    /// `similarity_search(query, k)`, falling back to `similarity_search(query)`
    SimilaritySearch,
    /// `underlying_index().similarity_search(query, k)` with the same fallback
    UnderlyingIndex,
}

impl RetrieverShape {
    pub const PROBE_ORDER: [Self; 5] = [
        Self::RelevantDocuments,
        Self::Retrieve,
        Self::GetDocuments,
        Self::SimilaritySearch,
        Self::UnderlyingIndex,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RelevantDocuments => "relevant_documents",
            Self::Retrieve => "retrieve",
            Self::GetDocuments => "get_documents",
            Self::SimilaritySearch => "similarity_search",
            Self::UnderlyingIndex => "underlying_index",
        }
    }
}

impl fmt::Display for RetrieverShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieval backend. Every method defaults to "not exposed" (`None`).
///
/// Count-taking methods receive `Some(k)` first; a backend that only accepts a
/// query answers that call with [`BackendError::ArityMismatch`] and is then
/// called again with `None`.
pub trait RetrieverBackend: Send + Sync {
    fn relevant_documents<'a>(&'a self, _query: &'a str) -> Option<DocsFuture<'a>> {
        None
    }

    fn retrieve<'a>(&'a self, _query: &'a str, _k: Option<usize>) -> Option<DocsFuture<'a>> {
        None
    }

    fn get_documents<'a>(&'a self, _query: &'a str) -> Option<DocsFuture<'a>> {
        None
    }

    fn similarity_search<'a>(
        &'a self,
        _query: &'a str,
        _k: Option<usize>,
    ) -> Option<DocsFuture<'a>> {
        None
    }

    fn underlying_index(&self) -> Option<&dyn RetrieverBackend> {
        None
    }
}

/// Documents returned by a retrieval together with the shape that served it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    pub documents: Vec<Document>,
    pub shape: RetrieverShape,
}

/// Call a count-taking method with `k`, retrying query-only on arity mismatch.
async fn with_count_fallback<'a, F>(
    method: F,
    k: usize,
) -> Option<Result<Vec<Document>, BackendError>>
where
    F: Fn(Option<usize>) -> Option<DocsFuture<'a>>,
{
    let first = method(Some(k))?.await;
    match first {
        Err(BackendError::ArityMismatch) => {
            tracing::debug!("retriever rejected count, retrying with query only");
            Some(method(None)?.await)
        }
        other => Some(other),
    }
}

async fn probe<'a>(
    backend: &'a dyn RetrieverBackend,
    shape: RetrieverShape,
    query: &'a str,
    k: usize,
) -> Option<Result<Vec<Document>, BackendError>> {
    match shape {
        RetrieverShape::RelevantDocuments => Some(backend.relevant_documents(query)?.await),
        RetrieverShape::Retrieve => with_count_fallback(|n| backend.retrieve(query, n), k).await,
        RetrieverShape::GetDocuments => Some(backend.get_documents(query)?.await),
        RetrieverShape::SimilaritySearch => {
            with_count_fallback(|n| backend.similarity_search(query, n), k).await
        }
        RetrieverShape::UnderlyingIndex => {
            let inner = backend.underlying_index()?;
            with_count_fallback(|n| inner.similarity_search(query, n), k).await
        }
    }
}

/// Fetch up to `k` documents for `query` through the first exposed shape.
///
/// # Errors
///
/// Returns [`BackendError::NoSupportedMethod`] when the backend exposes no
/// shape, or the backend's own error when the chosen method fails.
pub async fn call_retriever(
    backend: &dyn RetrieverBackend,
    query: &str,
    k: usize,
) -> Result<Retrieval, BackendError> {
    for shape in RetrieverShape::PROBE_ORDER {
        if let Some(result) = probe(backend, shape, query, k).await {
            let mut documents = result?;
            documents.truncate(k);
            tracing::debug!(%shape, returned = documents.len(), "retriever call complete");
            return Ok(Retrieval { documents, shape });
        }
    }
    Err(BackendError::NoSupportedMethod)
}
