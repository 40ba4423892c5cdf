use std::any::Any;
use std::fmt::{self, Write};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::error::ToolError;
use crate::tool::{Tool, ToolSpec};

/// Ordered set of uniquely named tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`ToolError::Duplicate`] if a tool with the same name exists.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        if self.find(tool.name()).is_some() {
            return Err(ToolError::Duplicate(tool.name().to_owned()));
        }
        tracing::debug!(tool = tool.name(), soft = tool.fails_soft(), "tool registered");
        self.tools.push(tool);
        Ok(())
    }

    /// Registered tools in registration order.
    #[must_use]
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    #[must_use]
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec::new(t.name(), t.description()))
            .collect()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn format_for_prompt(&self) -> String {
        format_specs(&self.specs())
    }

    /// Run tool `name` with `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Unknown`] for unregistered names and
    /// [`ToolError::Invocation`] when a hard tool fails. Soft tools never
    /// return an error.
    pub async fn invoke(&self, name: &str, query: &str) -> Result<String, ToolError> {
        let tool = self
            .find(name)
            .ok_or_else(|| ToolError::Unknown(name.to_owned()))?;
        let started = Instant::now();

        if !tool.fails_soft() {
            let result = tool.invoke(query).await;
            let elapsed_ms = started.elapsed().as_millis();
            return match result {
                Ok(text) => {
                    tracing::debug!(tool = name, elapsed_ms, chars = text.len(), "tool invoked");
                    Ok(text)
                }
                Err(source) => {
                    tracing::debug!(tool = name, elapsed_ms, error = %source, "tool failed");
                    Err(ToolError::Invocation {
                        name: name.to_owned(),
                        source,
                    })
                }
            };
        }

        // The async block defers `invoke` into the first poll so synchronous
        // panics are caught as well.
        let outcome = AssertUnwindSafe(async { tool.invoke(query).await })
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis();
        let reason = match outcome {
            Ok(Ok(text)) => {
                tracing::debug!(tool = name, elapsed_ms, chars = text.len(), "tool invoked");
                return Ok(text);
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        tracing::warn!(tool = name, elapsed_ms, %reason, "soft tool failed");
        Ok(format!("{name} failed: {reason}"))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Render tool specs as a prompt section.
#[must_use]
pub fn format_specs(specs: &[ToolSpec]) -> String {
    let mut out = String::from("<tools>\n");
    for spec in specs {
        format_tool(&mut out, spec);
    }
    out.push_str("</tools>");
    out
}

fn format_tool(out: &mut String, spec: &ToolSpec) {
    let _ = writeln!(out, "## {}", spec.name);
    let _ = writeln!(out, "{}", spec.description);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::FnTool;

    fn echo() -> Arc<dyn Tool> {
        Arc::new(FnTool::new("echo", "Echo the query.", |q: String| async move {
            Ok::<_, anyhow::Error>(q)
        }))
    }

    fn broken(soft: bool) -> Arc<dyn Tool> {
        let tool = FnTool::new("broken", "Always fails.", |_q: String| async {
            Err::<String, _>(anyhow::anyhow!("connection refused"))
        });
        if soft {
            Arc::new(tool.soft())
        } else {
            Arc::new(tool)
        }
    }

    struct Panicking;

    impl Tool for Panicking {
        fn name(&self) -> &str {
            "panicky"
        }

        fn description(&self) -> &str {
            "Panics on use."
        }

        fn fails_soft(&self) -> bool {
            true
        }

        fn invoke<'a>(
            &'a self,
            _query: &'a str,
        ) -> futures::future::BoxFuture<'a, anyhow::Result<String>> {
            panic!("boom")
        }
    }

    #[test]
    fn default_registry_is_empty() {
        let reg = ToolRegistry::default();
        assert!(reg.list().is_empty());
        assert!(reg.specs().is_empty());
    }

    #[test]
    fn register_keeps_order() {
        let mut reg = ToolRegistry::new();
        reg.register(echo()).unwrap();
        reg.register(broken(false)).unwrap();
        let names: Vec<String> = reg.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["echo", "broken"]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = ToolRegistry::new();
        reg.register(echo()).unwrap();
        let err = reg.register(echo()).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(ref n) if n == "echo"));
        assert_eq!(reg.list().len(), 1);
    }

    #[test]
    fn format_for_prompt_lists_tools() {
        let mut reg = ToolRegistry::new();
        reg.register(echo()).unwrap();
        let prompt = reg.format_for_prompt();
        assert!(prompt.starts_with("<tools>\n"));
        assert!(prompt.contains("## echo\nEcho the query.\n"));
        assert!(prompt.ends_with("</tools>"));
    }

    #[tokio::test]
    async fn invoke_unknown_tool() {
        let reg = ToolRegistry::new();
        let err = reg.invoke("translate", "hola").await.unwrap_err();
        assert!(matches!(err, ToolError::Unknown(ref n) if n == "translate"));
    }

    #[tokio::test]
    async fn invoke_returns_output() {
        let mut reg = ToolRegistry::new();
        reg.register(echo()).unwrap();
        assert_eq!(reg.invoke("echo", "hello").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn hard_failure_propagates() {
        let mut reg = ToolRegistry::new();
        reg.register(broken(false)).unwrap();
        let err = reg.invoke("broken", "q").await.unwrap_err();
        assert!(matches!(err, ToolError::Invocation { ref name, .. } if name == "broken"));
    }

    #[tokio::test]
    async fn soft_failure_becomes_text() {
        let mut reg = ToolRegistry::new();
        reg.register(broken(true)).unwrap();
        let text = reg.invoke("broken", "q").await.unwrap();
        assert_eq!(text, "broken failed: connection refused");
    }

    #[tokio::test]
    async fn soft_panic_becomes_text() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(Panicking)).unwrap();
        let text = reg.invoke("panicky", "q").await.unwrap();
        assert!(text.starts_with("panicky failed: panicked: boom"), "{text}");
    }
}
