use std::sync::Arc;

use quarry_index::{IndexError, VectorIndex};
use quarry_llm::LlmProvider;

use super::PipelineError;
use super::step::Step;
use crate::agent::{Agent, AgentError, Reasoner};
use crate::state::RagState;

/// Fills `retrieved_docs` from the index, keyed by the question.
pub struct RetrieveStep<P> {
    index: Arc<VectorIndex<P>>,
    k: usize,
}

impl<P> RetrieveStep<P> {
    #[must_use]
    pub fn new(index: Arc<VectorIndex<P>>, k: usize) -> Self {
        Self { index, k }
    }
}

impl<P: LlmProvider + 'static> RetrieveStep<P> {
    /// # Errors
    ///
    /// Propagates index failures, including an index that was never built.
    pub async fn retrieve_docs(&self, state: &RagState) -> Result<RagState, IndexError> {
        let (retrieval, generation) = self
            .index
            .retrieve_versioned(state.question(), self.k)
            .await?;
        tracing::info!(
            docs = retrieval.documents.len(),
            shape = %retrieval.shape,
            generation,
            "context retrieved"
        );
        Ok(state.with_documents(retrieval.documents, generation))
    }
}

impl<P: LlmProvider + 'static> Step for RetrieveStep<P> {
    type Input = RagState;
    type Output = RagState;

    fn name(&self) -> &'static str {
        "retrieve"
    }

    async fn run(&self, input: Self::Input) -> Result<Self::Output, PipelineError> {
        Ok(self.retrieve_docs(&input).await?)
    }
}

/// Runs the reasoning agent over the state's question.
pub struct AnswerStep<R> {
    agent: Arc<Agent<R>>,
}

impl<R> AnswerStep<R> {
    #[must_use]
    pub fn new(agent: Arc<Agent<R>>) -> Self {
        Self { agent }
    }
}

impl<R: Reasoner> AnswerStep<R> {
    /// # Errors
    ///
    /// See [`Agent::generate_answer`].
    pub async fn generate_answer(&self, state: &RagState) -> Result<RagState, AgentError> {
        self.agent.generate_answer(state).await
    }
}

impl<R: Reasoner> Step for AnswerStep<R> {
    type Input = RagState;
    type Output = RagState;

    fn name(&self) -> &'static str {
        "answer"
    }

    async fn run(&self, input: Self::Input) -> Result<Self::Output, PipelineError> {
        Ok(self.generate_answer(&input).await?)
    }
}
