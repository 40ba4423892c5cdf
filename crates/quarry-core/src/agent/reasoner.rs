use std::fmt::Write;
use std::future::Future;
use std::sync::Arc;

use quarry_llm::{LlmError, LlmProvider, Message};
use quarry_tools::{ToolSpec, format_specs};

use super::transcript::{Transcript, Turn};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a reasoning agent that uses tools when needed. \
Prefer 'retriever' for document-based answers; use 'wikipedia' for general world knowledge. \
Always return the final answer only.";

/// What the reasoner wants to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Answer {
        thought: Option<String>,
        answer: String,
    },
    UseTool {
        thought: Option<String>,
        tool: String,
        query: String,
    },
}

/// Decides the next move given the transcript so far and the available tools.
pub trait Reasoner: Send + Sync {
    fn decide(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
    ) -> impl Future<Output = Result<Decision, LlmError>> + Send;
}

/// ReAct-style reasoner over a chat model.
pub struct LlmReasoner<P> {
    provider: Arc<P>,
    system_prompt: String,
}

impl<P> std::fmt::Debug for LlmReasoner<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmReasoner")
            .field("system_prompt", &self.system_prompt)
            .finish_non_exhaustive()
    }
}

impl<P> LlmReasoner<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn build_messages(&self, transcript: &Transcript, tools: &[ToolSpec]) -> Vec<Message> {
        let names = tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut system = self.system_prompt.clone();
        let _ = write!(
            system,
            "\n\nYou have access to the following tools:\n\n{}\n\n\
             Use the following format:\n\n\
             Question: the input question you must answer\n\
             Thought: you should always think about what to do\n\
             Action: the action to take, should be one of [{names}]\n\
             Action Input: the input to the action\n\
             Observation: the result of the action\n\
             ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
             Thought: I now know the final answer\n\
             Final Answer: the final answer to the original input question",
            format_specs(tools)
        );

        vec![Message::system(system), Message::user(render_scratchpad(transcript))]
    }
}

fn render_scratchpad(transcript: &Transcript) -> String {
    let mut out = format!("Question: {}", transcript.question());
    for turn in transcript.turns() {
        match turn {
            Turn::Reasoning { text } => {
                let _ = write!(out, "\nThought: {text}");
            }
            Turn::ToolCall {
                tool,
                query,
                observation,
            } => {
                let _ = write!(
                    out,
                    "\nAction: {tool}\nAction Input: {query}\nObservation: {observation}"
                );
            }
            Turn::FinalAnswer { text } => {
                let _ = write!(out, "\nFinal Answer: {text}");
            }
        }
    }
    out
}

impl<P: LlmProvider> Reasoner for LlmReasoner<P> {
    async fn decide(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
    ) -> Result<Decision, LlmError> {
        let messages = self.build_messages(transcript, tools);
        let reply = self.provider.chat(&messages).await?;
        tracing::debug!(provider = self.provider.name(), chars = reply.len(), "reasoner reply");
        Ok(parse_react(&reply, tools))
    }
}

const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const FINAL_ANSWER: &str = "Final Answer:";
const OBSERVATION: &str = "Observation:";

/// Parse a ReAct-formatted model reply.
///
/// An `Action:` that comes before any `Final Answer:` is a tool request.
/// Text carrying neither marker is taken as the answer itself.
#[must_use]
pub fn parse_react(reply: &str, tools: &[ToolSpec]) -> Decision {
    let reply = reply.trim();
    let action_at = reply.find(ACTION);
    let final_at = reply.find(FINAL_ANSWER);

    match (action_at, final_at) {
        (Some(a), f) if f.is_none_or(|f| a < f) => {
            let thought = thought_before(reply, a);
            let rest = &reply[a + ACTION.len()..];
            let (name_line, after_name) = rest.split_once('\n').unwrap_or((rest, ""));
            let query = after_name.find(ACTION_INPUT).map_or("", |i| {
                let input = &after_name[i + ACTION_INPUT.len()..];
                input.find(OBSERVATION).map_or(input, |end| &input[..end])
            });
            Decision::UseTool {
                thought,
                tool: resolve_tool_name(clean(name_line), tools),
                query: clean(query).to_owned(),
            }
        }
        (_, Some(f)) => Decision::Answer {
            thought: thought_before(reply, f),
            answer: reply[f + FINAL_ANSWER.len()..].trim().to_owned(),
        },
        _ => Decision::Answer {
            thought: None,
            answer: reply.to_owned(),
        },
    }
}

fn thought_before(reply: &str, end: usize) -> Option<String> {
    let head = reply[..end].trim();
    let head = head.strip_prefix("Thought:").unwrap_or(head).trim();
    (!head.is_empty()).then(|| head.to_owned())
}

fn clean(s: &str) -> &str {
    s.trim().trim_matches(['`', '"', '\'', '*']).trim()
}

/// Exact match first, then case-insensitive in listing order.
fn resolve_tool_name(raw: &str, tools: &[ToolSpec]) -> String {
    if tools.iter().any(|t| t.name == raw) {
        return raw.to_owned();
    }
    tools
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(raw))
        .map_or_else(|| raw.to_owned(), |t| t.name.clone())
}
