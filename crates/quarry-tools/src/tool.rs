use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use serde::Serialize;

/// A capability the reasoning agent may invoke with a text query.
///
/// `invoke` returns a boxed future so tools can live side by side as
/// `Arc<dyn Tool>` in a [`crate::ToolRegistry`].
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Soft tools turn every failure, panics included, into result text.
    fn fails_soft(&self) -> bool {
        false
    }

    fn invoke<'a>(&'a self, query: &'a str) -> BoxFuture<'a, anyhow::Result<String>>;
}

/// Name and description pair shown to the reasoner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

impl ToolSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Tool backed by an async closure taking the owned query.
pub struct FnTool<F> {
    name: String,
    description: String,
    soft: bool,
    func: F,
}

impl<F> FnTool<F> {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            soft: false,
            func,
        }
    }

    #[must_use]
    pub fn soft(mut self) -> Self {
        self.soft = true;
        self
    }
}

impl<F> fmt::Debug for FnTool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("soft", &self.soft)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn fails_soft(&self) -> bool {
        self.soft
    }

    fn invoke<'a>(&'a self, query: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin((self.func)(query.to_owned()))
    }
}
