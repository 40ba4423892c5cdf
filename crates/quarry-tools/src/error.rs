#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),

    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("tool '{name}' failed: {source}")]
    Invocation {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ToolError {
    /// Name of the tool this error is about.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::Duplicate(name) | Self::Unknown(name) | Self::Invocation { name, .. } => name,
        }
    }
}
