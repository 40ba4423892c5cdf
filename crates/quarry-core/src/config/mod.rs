mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::Context;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the resulting configuration is invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent.max_tool_invocations == 0 {
            anyhow::bail!("agent.max_tool_invocations must be at least 1");
        }
        if self.agent.reasoning_timeout_secs == 0 {
            anyhow::bail!("agent.reasoning_timeout_secs must be at least 1");
        }
        if self.index.default_k == 0 {
            anyhow::bail!("index.default_k must be at least 1");
        }
        if self.tools.retriever.k == 0 {
            anyhow::bail!("tools.retriever.k must be at least 1");
        }
        if self.tools.retriever.max_results == 0 {
            anyhow::bail!("tools.retriever.max_results must be at least 1");
        }
        if self.tools.wikipedia.top_k_results == 0 {
            anyhow::bail!("tools.wikipedia.top_k_results must be at least 1");
        }
        if self.index.chunk_size == 0 {
            anyhow::bail!("index.chunk_size must be at least 1");
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            anyhow::bail!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap,
                self.index.chunk_size
            );
        }
        if self.llm.chat_command.is_empty() {
            anyhow::bail!("llm.chat_command must not be empty");
        }
        if self.llm.embed_command.is_empty() {
            anyhow::bail!("llm.embed_command must not be empty");
        }
        Ok(())
    }
}
