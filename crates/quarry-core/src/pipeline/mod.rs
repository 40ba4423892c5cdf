pub mod builder;
pub mod builtin;
mod rag;
pub mod step;

pub use builder::Pipeline;
pub use builtin::{AnswerStep, RetrieveStep};
pub use rag::RagPipeline;
pub use step::Step;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Index(#[from] quarry_index::IndexError),

    #[error(transparent)]
    Agent(#[from] crate::agent::AgentError),
}
