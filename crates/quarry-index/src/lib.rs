//! Nearest-neighbor document index behind a single `retrieve(query, k)` contract.

pub mod backend;
pub mod document;
pub mod error;
pub mod index;
mod store;

pub use backend::{BackendError, Retrieval, RetrieverBackend, RetrieverShape, call_retriever};
pub use document::Document;
pub use error::IndexError;
pub use index::{DEFAULT_K, VectorIndex};
