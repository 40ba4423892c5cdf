use std::sync::Arc;

use futures::future::BoxFuture;
use quarry_index::{Document, VectorIndex};
use quarry_llm::LlmProvider;

use crate::config::RetrieverConfig;
use crate::tool::Tool;

pub const RETRIEVER_TOOL_NAME: &str = "retriever";

const NO_DOCUMENTS: &str = "No documents found.";

/// Fetches passages from the shared [`VectorIndex`].
///
/// Index failures propagate; this tool is not soft.
pub struct RetrieverTool<P> {
    index: Arc<VectorIndex<P>>,
    k: usize,
    max_results: usize,
}

impl<P> std::fmt::Debug for RetrieverTool<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverTool")
            .field("k", &self.k)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

impl<P> RetrieverTool<P> {
    #[must_use]
    pub fn new(index: Arc<VectorIndex<P>>, config: &RetrieverConfig) -> Self {
        Self {
            index,
            k: config.k,
            max_results: config.max_results,
        }
    }
}

impl<P: LlmProvider + 'static> Tool for RetrieverTool<P> {
    fn name(&self) -> &str {
        RETRIEVER_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Fetch passages from your vectorstore."
    }

    fn invoke<'a>(&'a self, query: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let docs = self.index.retrieve(query, self.k).await?;
            Ok(format_documents(&docs, self.max_results))
        })
    }
}

/// Render documents as numbered passages: `[i] <title>` then the content.
///
/// The title falls back from the `title` metadata to `source` to `doc_<i>`.
/// Nothing to show, including `max_results == 0`, renders as `No documents found.`.
#[must_use]
pub fn format_documents(docs: &[Document], max_results: usize) -> String {
    if docs.is_empty() || max_results == 0 {
        return NO_DOCUMENTS.to_owned();
    }
    docs.iter()
        .take(max_results)
        .enumerate()
        .map(|(i, doc)| {
            let n = i + 1;
            let title = doc
                .meta("title")
                .or_else(|| doc.meta("source"))
                .map_or_else(|| format!("doc_{n}"), str::to_owned);
            format!("[{n}] {title}\n{}", doc.content())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use quarry_index::IndexError;
    use quarry_llm::mock::MockProvider;

    use super::*;
    use crate::error::ToolError;
    use crate::registry::ToolRegistry;

    #[test]
    fn empty_is_no_documents() {
        assert_eq!(format_documents(&[], 8), "No documents found.");
    }

    #[test]
    fn title_fallback_chain() {
        let docs = vec![
            Document::new("one")
                .with_metadata("title", "Paris")
                .with_metadata("source", "fr.txt"),
            Document::new("two").with_metadata("source", "de.txt"),
            Document::new("three").with_metadata("title", ""),
        ];
        assert_eq!(
            format_documents(&docs, 8),
            "[1] Paris\none\n\n[2] de.txt\ntwo\n\n[3] doc_3\nthree"
        );
    }

    #[test]
    fn caps_at_max_results() {
        let docs: Vec<Document> = (0..12).map(|i| Document::new(format!("d{i}"))).collect();
        let out = format_documents(&docs, 8);
        assert!(out.contains("[8] doc_8"));
        assert!(!out.contains("[9]"));
    }

    fn tool(index: Arc<VectorIndex<MockProvider>>) -> RetrieverTool<MockProvider> {
        RetrieverTool::new(index, &RetrieverConfig::default())
    }

    #[tokio::test]
    async fn retrieves_from_index() {
        let index = Arc::new(VectorIndex::new(Arc::new(
            MockProvider::default().with_bag_of_words(1024),
        )));
        index
            .build(vec![
                Document::new("Berlin is the capital of Germany."),
                Document::new("Paris is the capital of France.").with_metadata("title", "France"),
            ])
            .await
            .unwrap();
        let out = tool(index).invoke("capital of France").await.unwrap();
        assert!(out.starts_with("[1] France\nParis"), "{out}");
        assert!(out.contains("[2] doc_2\nBerlin"));
    }

    #[tokio::test]
    async fn zero_max_results_renders_no_documents() {
        let index = Arc::new(VectorIndex::new(Arc::new(
            MockProvider::default().with_bag_of_words(64),
        )));
        index
            .build(vec![Document::new("Paris is the capital of France.")])
            .await
            .unwrap();
        let capped = RetrieverTool::new(
            index,
            &RetrieverConfig {
                k: 4,
                max_results: 0,
            },
        );
        assert_eq!(capped.invoke("Paris").await.unwrap(), "No documents found.");
    }

    #[tokio::test]
    async fn unbuilt_index_propagates_through_registry() {
        let index = Arc::new(VectorIndex::new(Arc::new(MockProvider::default())));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(tool(index))).unwrap();
        let err = registry.invoke("retriever", "q").await.unwrap_err();
        let ToolError::Invocation { source, .. } = err else {
            panic!("expected invocation error, got {err:?}");
        };
        assert!(matches!(
            source.downcast_ref::<IndexError>(),
            Some(IndexError::NotBuilt)
        ));
    }
}
