#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Tool(#[from] quarry_tools::ToolError),

    #[error(transparent)]
    Llm(#[from] quarry_llm::LlmError),

    #[error("reasoning step timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}
