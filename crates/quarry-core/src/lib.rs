//! Reasoning agent, retrieve-then-answer pipeline, and configuration.

pub mod agent;
pub mod config;
pub mod pipeline;
pub mod state;

pub use agent::{Agent, AgentError, LlmReasoner, NO_ANSWER, Reasoner, Transcript};
pub use config::Config;
pub use pipeline::{PipelineError, RagPipeline};
pub use state::RagState;
