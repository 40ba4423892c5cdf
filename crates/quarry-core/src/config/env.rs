use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QUARRY_MAX_TOOL_INVOCATIONS") {
            if let Ok(n) = v.parse::<usize>() {
                self.agent.max_tool_invocations = n;
            } else {
                tracing::warn!("ignoring invalid QUARRY_MAX_TOOL_INVOCATIONS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("QUARRY_REASONING_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.agent.reasoning_timeout_secs = secs;
            } else {
                tracing::warn!("ignoring invalid QUARRY_REASONING_TIMEOUT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("QUARRY_DEFAULT_K") {
            if let Ok(k) = v.parse::<usize>() {
                self.index.default_k = k;
            } else {
                tracing::warn!("ignoring invalid QUARRY_DEFAULT_K value: {v}");
            }
        }
        if let Ok(v) = std::env::var("QUARRY_CHAT_COMMAND") {
            self.llm.chat_command = split_command(&v);
        }
        if let Ok(v) = std::env::var("QUARRY_EMBED_COMMAND") {
            self.llm.embed_command = split_command(&v);
        }
        if let Ok(v) = std::env::var("QUARRY_WIKIPEDIA_ENABLED")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.tools.wikipedia.enabled = enabled;
        }
        if let Ok(v) = std::env::var("QUARRY_WIKIPEDIA_LANG")
            && !v.trim().is_empty()
        {
            self.tools.wikipedia.lang = v.trim().to_owned();
        }
    }
}

fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}
