use std::sync::Arc;

use quarry_index::VectorIndex;
use quarry_llm::LlmProvider;

use super::PipelineError;
use super::builder::{Chain, Pipeline, Start};
use super::builtin::{AnswerStep, RetrieveStep};
use crate::agent::{Agent, Reasoner};
use crate::state::RagState;

type RagSteps<P, R> = Chain<Start<RetrieveStep<P>>, AnswerStep<R>>;

/// Retrieve context for a question, then let the agent answer it.
///
/// Documents are fetched twice: once eagerly here, and again whenever the
/// agent calls the retriever tool. A rebuild in between makes the two differ;
/// [`Self::index_changed`] reports it and `run` logs a warning.
pub struct RagPipeline<P, R> {
    index: Arc<VectorIndex<P>>,
    pipeline: Pipeline<RagSteps<P, R>>,
}

impl<P: LlmProvider + 'static, R: Reasoner> RagPipeline<P, R> {
    #[must_use]
    pub fn new(index: Arc<VectorIndex<P>>, agent: Arc<Agent<R>>, k: usize) -> Self {
        let pipeline = Pipeline::start(RetrieveStep::new(Arc::clone(&index), k))
            .step(AnswerStep::new(agent));
        Self { index, pipeline }
    }

    /// # Errors
    ///
    /// Returns [`PipelineError`] if retrieval or answering fails; no partial
    /// state is returned.
    pub async fn run(&self, question: &str) -> Result<RagState, PipelineError> {
        let state = self.pipeline.run(RagState::new(question)).await?;
        if self.index_changed(&state) {
            tracing::warn!(
                seen = state.retrieval_generation(),
                current = self.index.generation(),
                "index changed during run; retrieved_docs may not match what the agent saw"
            );
        }
        tracing::info!(
            docs = state.retrieved_docs().len(),
            answered = state.answer().is_some(),
            "pipeline finished"
        );
        Ok(state)
    }

    /// Whether the index was rebuilt or replaced after `state` was retrieved.
    #[must_use]
    pub fn index_changed(&self, state: &RagState) -> bool {
        state
            .retrieval_generation()
            .is_some_and(|seen| seen != self.index.generation())
    }
}
