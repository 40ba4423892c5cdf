use crate::backend::BackendError;
use crate::document::Document;

pub(crate) struct IndexEntry {
    pub(crate) document: Document,
    pub(crate) embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub(crate) struct ScoredDocument {
    pub(crate) document: Document,
    pub(crate) score: f32,
}

/// Brute-force cosine store. Every entry shares `dimension`.
pub(crate) struct FlatStore {
    entries: Vec<IndexEntry>,
    dimension: usize,
}

impl std::fmt::Debug for FlatStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatStore")
            .field("entries", &self.entries.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl FlatStore {
    /// Callers guarantee `entries` is non-empty and uniformly sized.
    pub(crate) fn new(entries: Vec<IndexEntry>, dimension: usize) -> Self {
        Self { entries, dimension }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn dimension(&self) -> usize {
        self.dimension
    }

    /// Top `limit` entries by descending cosine similarity. Ties keep insertion order.
    pub(crate) fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, BackendError> {
        if vector.len() != self.dimension {
            return Err(BackendError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<ScoredDocument> = self
            .entries
            .iter()
            .map(|entry| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_similarity(vector, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }
}
