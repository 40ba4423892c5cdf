use quarry_index::Document;
use serde::Serialize;

use crate::agent::Transcript;

/// Per-question record handed from stage to stage.
///
/// Stages never mutate their input: `with_documents` and `with_answer` return
/// a new state derived from `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RagState {
    question: String,
    retrieved_docs: Vec<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcript: Option<Transcript>,
    /// Index generation that served `retrieved_docs`.
    #[serde(skip)]
    retrieval_generation: Option<u64>,
}

impl RagState {
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            retrieved_docs: Vec::new(),
            answer: None,
            transcript: None,
            retrieval_generation: None,
        }
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn retrieved_docs(&self) -> &[Document] {
        &self.retrieved_docs
    }

    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    #[must_use]
    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    #[must_use]
    pub fn retrieval_generation(&self) -> Option<u64> {
        self.retrieval_generation
    }

    #[must_use]
    pub fn with_documents(&self, docs: Vec<Document>, generation: u64) -> Self {
        Self {
            retrieved_docs: docs,
            retrieval_generation: Some(generation),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_answer(&self, answer: impl Into<String>, transcript: Transcript) -> Self {
        Self {
            answer: Some(answer.into()),
            transcript: Some(transcript),
            ..self.clone()
        }
    }
}
