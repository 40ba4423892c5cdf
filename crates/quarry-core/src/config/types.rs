use quarry_tools::ToolsConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_max_tool_invocations() -> usize {
    6
}

fn default_reasoning_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_tool_invocations")]
    pub max_tool_invocations: usize,
    #[serde(default = "default_reasoning_timeout_secs")]
    pub reasoning_timeout_secs: u64,
    /// Replaces the built-in system prompt when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_invocations: default_max_tool_invocations(),
            reasoning_timeout_secs: default_reasoning_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_k() -> usize {
    quarry_index::DEFAULT_K
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

/// Eager retrieval count and document chunking.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chat_command() -> Vec<String> {
    ["llm", "-m", "gpt-4o-mini"].map(String::from).to_vec()
}

fn default_embed_command() -> Vec<String> {
    ["llm", "embed", "-m", "3-small"].map(String::from).to_vec()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

/// External commands that serve chat completions and embeddings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_chat_command")]
    pub chat_command: Vec<String>,
    #[serde(default = "default_embed_command")]
    pub embed_command: Vec<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            chat_command: default_chat_command(),
            embed_command: default_embed_command(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}
