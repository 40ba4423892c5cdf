use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_retriever_k() -> usize {
    quarry_index::DEFAULT_K
}

fn default_max_results() -> usize {
    8
}

fn default_lang() -> String {
    "en".into()
}

fn default_top_k_results() -> usize {
    3
}

fn default_max_chars() -> usize {
    4000
}

fn default_wikipedia_timeout() -> u64 {
    15
}

/// Top-level configuration for the agent's tools.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub retriever: RetrieverConfig,
    #[serde(default)]
    pub wikipedia: WikipediaConfig,
}

/// Retriever tool: how many passages to fetch and how many to show.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieverConfig {
    #[serde(default = "default_retriever_k")]
    pub k: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            k: default_retriever_k(),
            max_results: default_max_results(),
        }
    }
}

/// Wikipedia tool: language edition, result count, output cap, HTTP timeout.
#[derive(Debug, Clone, Deserialize)]
pub struct WikipediaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_top_k_results")]
    pub top_k_results: usize,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_wikipedia_timeout")]
    pub timeout_secs: u64,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lang: default_lang(),
            top_k_results: default_top_k_results(),
            max_chars: default_max_chars(),
            timeout_secs: default_wikipedia_timeout(),
        }
    }
}
