//! Tool-using reasoning loop.
//!
//! The agent alternates between asking its [`Reasoner`] for a decision and
//! running the requested tool, until the reasoner answers or the tool budget
//! runs out.

mod error;
pub mod reasoner;
pub mod transcript;

pub use error::AgentError;
pub use reasoner::{DEFAULT_SYSTEM_PROMPT, Decision, LlmReasoner, Reasoner, parse_react};
pub use transcript::{Transcript, Turn};

use std::sync::Arc;
use std::time::Duration;

use quarry_tools::ToolRegistry;
use tracing::Instrument as _;

use crate::config::AgentConfig;
use crate::state::RagState;

/// Answer returned when the loop cannot produce one.
pub const NO_ANSWER: &str = "Could not generate answer.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoopState {
    Thinking,
    AwaitingToolResult { tool: String, query: String },
    Done(String),
    Exhausted,
}

pub struct Agent<R> {
    reasoner: R,
    tools: Arc<ToolRegistry>,
    max_tool_invocations: usize,
    reasoning_timeout: Duration,
}

impl<R> std::fmt::Debug for Agent<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("tools", &self.tools)
            .field("max_tool_invocations", &self.max_tool_invocations)
            .field("reasoning_timeout", &self.reasoning_timeout)
            .finish_non_exhaustive()
    }
}

impl<R: Reasoner> Agent<R> {
    #[must_use]
    pub fn new(reasoner: R, tools: Arc<ToolRegistry>, config: &AgentConfig) -> Self {
        Self {
            reasoner,
            tools,
            max_tool_invocations: config.max_tool_invocations,
            reasoning_timeout: Duration::from_secs(config.reasoning_timeout_secs),
        }
    }

    #[must_use]
    pub fn with_reasoning_timeout(mut self, timeout: Duration) -> Self {
        self.reasoning_timeout = timeout;
        self
    }

    /// Answer `state.question`, returning a new state with the answer and the
    /// transcript attached. `state` itself is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates reasoner failures, timeouts, unknown tools, and hard tool
    /// failures. Running out of tool invocations is not an error.
    pub async fn generate_answer(&self, state: &RagState) -> Result<RagState, AgentError> {
        let mut transcript = Transcript::new(state.question());
        let answer = self
            .run(&mut transcript)
            .instrument(tracing::info_span!("agent_run"))
            .await?;
        Ok(state.with_answer(answer, transcript))
    }

    /// Drive the loop to completion, appending every turn to `transcript`.
    ///
    /// # Errors
    ///
    /// See [`Self::generate_answer`].
    pub async fn run(&self, transcript: &mut Transcript) -> Result<String, AgentError> {
        let specs = self.tools.specs();
        let mut invocations = 0usize;
        let mut state = LoopState::Thinking;

        loop {
            state = match state {
                LoopState::Thinking => {
                    let decision = tokio::time::timeout(
                        self.reasoning_timeout,
                        self.reasoner.decide(transcript, &specs),
                    )
                    .await
                    .map_err(|_| AgentError::Timeout {
                        timeout_secs: self.reasoning_timeout.as_secs(),
                    })??;

                    match decision {
                        Decision::Answer { thought, answer } => {
                            record_thought(transcript, thought);
                            LoopState::Done(answer)
                        }
                        Decision::UseTool {
                            thought,
                            tool,
                            query,
                        } => {
                            record_thought(transcript, thought);
                            if invocations >= self.max_tool_invocations {
                                LoopState::Exhausted
                            } else {
                                LoopState::AwaitingToolResult { tool, query }
                            }
                        }
                    }
                }
                LoopState::AwaitingToolResult { tool, query } => {
                    tracing::debug!(%tool, %query, invocation = invocations + 1, "calling tool");
                    let observation = self.tools.invoke(&tool, &query).await?;
                    invocations += 1;
                    transcript.push(Turn::ToolCall {
                        tool,
                        query,
                        observation,
                    });
                    LoopState::Thinking
                }
                LoopState::Done(answer) => {
                    let answer = answer.trim();
                    let answer = if answer.is_empty() {
                        tracing::warn!("reasoner returned an empty answer");
                        NO_ANSWER
                    } else {
                        answer
                    };
                    tracing::info!(tool_calls = invocations, "answer ready");
                    return Ok(finish(transcript, answer));
                }
                LoopState::Exhausted => {
                    tracing::warn!(
                        limit = self.max_tool_invocations,
                        "tool invocation budget exhausted"
                    );
                    return Ok(finish(transcript, NO_ANSWER));
                }
            };
        }
    }
}

fn record_thought(transcript: &mut Transcript, thought: Option<String>) {
    if let Some(text) = thought {
        transcript.push(Turn::Reasoning { text });
    }
}

fn finish(transcript: &mut Transcript, answer: &str) -> String {
    transcript.push(Turn::FinalAnswer {
        text: answer.to_owned(),
    });
    answer.to_owned()
}
