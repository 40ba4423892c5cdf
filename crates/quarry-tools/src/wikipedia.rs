use std::time::Duration;

use anyhow::Context as _;
use futures::future::BoxFuture;
use serde::Deserialize;
use url::Url;

use crate::config::WikipediaConfig;
use crate::tool::Tool;

pub const WIKIPEDIA_TOOL_NAME: &str = "wikipedia";

const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    /// Search rank, 1-based.
    #[serde(default)]
    index: usize,
    #[serde(default)]
    extract: String,
}

/// General-knowledge lookup against the `MediaWiki` search API.
///
/// Always soft: network or parse failures reach the agent as text.
#[derive(Debug)]
pub struct WikipediaTool {
    client: reqwest::Client,
    endpoint: String,
    top_k_results: usize,
    max_chars: usize,
}

impl WikipediaTool {
    #[must_use]
    pub fn new(config: &WikipediaConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("quarry/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: format!("https://{}.wikipedia.org/w/api.php", config.lang),
            top_k_results: config.top_k_results,
            max_chars: config.max_chars,
        }
    }

    /// Point the tool at a different API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search(&self, query: &str) -> anyhow::Result<String> {
        let limit = self.top_k_results.to_string();
        let url = Url::parse_with_params(
            &self.endpoint,
            [
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", limit.as_str()),
            ],
        )
        .with_context(|| format!("invalid endpoint: {}", self.endpoint))?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("HTTP {}", resp.status());
        }
        let bytes = resp.bytes().await.context("reading response body")?;
        let parsed: QueryResponse =
            serde_json::from_slice(&bytes).context("malformed search response")?;

        let mut pages = parsed.query.map(|q| q.pages).unwrap_or_default();
        pages.sort_by_key(|p| p.index);
        pages.truncate(self.top_k_results);
        tracing::debug!(query, hits = pages.len(), "wikipedia search");

        Ok(render_pages(&pages, self.max_chars))
    }
}

fn render_pages(pages: &[Page], max_chars: usize) -> String {
    let summaries: Vec<String> = pages
        .iter()
        .filter(|p| !p.extract.trim().is_empty())
        .map(|p| format!("Page: {}\nSummary: {}", p.title, p.extract.trim()))
        .collect();
    if summaries.is_empty() {
        return NO_RESULTS.to_owned();
    }
    let joined = summaries.join("\n\n");
    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => joined[..cut].to_owned(),
        None => joined,
    }
}

impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        WIKIPEDIA_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search Wikipedia for general information."
    }

    fn fails_soft(&self) -> bool {
        true
    }

    fn invoke<'a>(&'a self, query: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(self.search(query))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::registry::ToolRegistry;

    fn tool(server: &MockServer) -> WikipediaTool {
        WikipediaTool::new(&WikipediaConfig::default())
            .with_endpoint(format!("{}/w/api.php", server.uri()))
    }

    fn page(title: &str, index: usize, extract: &str) -> Page {
        Page {
            title: title.into(),
            index,
            extract: extract.into(),
        }
    }

    #[test]
    fn render_formats_pages() {
        let out = render_pages(
            &[page("Paris", 1, "Capital of France."), page("Lyon", 2, "A city.")],
            4000,
        );
        assert_eq!(
            out,
            "Page: Paris\nSummary: Capital of France.\n\nPage: Lyon\nSummary: A city."
        );
    }

    #[test]
    fn render_truncates_on_char_boundary() {
        let out = render_pages(&[page("Zürich", 1, "Größte Stadt.")], 10);
        assert_eq!(out.chars().count(), 10);
        assert_eq!(out, "Page: Züri");
    }

    #[test]
    fn render_empty_is_no_result() {
        assert_eq!(render_pages(&[], 4000), NO_RESULTS);
        assert_eq!(render_pages(&[page("Blank", 1, "  ")], 4000), NO_RESULTS);
    }

    #[tokio::test]
    async fn search_orders_by_rank() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("gsrsearch", "Eiffel Tower"))
            .and(query_param("gsrlimit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": true,
                "query": {"pages": [
                    {"pageid": 2, "title": "Gustave Eiffel", "index": 2, "extract": "French engineer."},
                    {"pageid": 1, "title": "Eiffel Tower", "index": 1, "extract": "Tower in Paris."}
                ]}
            })))
            .mount(&server)
            .await;

        let out = tool(&server).invoke("Eiffel Tower").await.unwrap();
        assert!(out.starts_with("Page: Eiffel Tower\nSummary: Tower in Paris."), "{out}");
        assert!(out.contains("Page: Gustave Eiffel"));
    }

    #[tokio::test]
    async fn no_hits_is_no_result_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"batchcomplete": true})),
            )
            .mount(&server)
            .await;

        assert_eq!(tool(&server).invoke("qwzxv").await.unwrap(), NO_RESULTS);
    }

    #[tokio::test]
    async fn http_error_is_an_error_when_called_directly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = tool(&server).invoke("Paris").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn registry_soft_fails_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(tool(&server))).unwrap();
        let text = registry.invoke("wikipedia", "Paris").await.unwrap();
        assert!(text.starts_with("wikipedia failed: HTTP 500"), "{text}");
    }

    #[tokio::test]
    async fn registry_soft_fails_on_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json {{"))
            .mount(&server)
            .await;

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(tool(&server))).unwrap();
        let text = registry.invoke("wikipedia", "Paris").await.unwrap();
        assert!(text.contains("wikipedia"));
        assert!(text.contains("malformed search response"));
    }

    #[test]
    fn endpoint_follows_lang() {
        let config = WikipediaConfig {
            lang: "de".into(),
            ..WikipediaConfig::default()
        };
        let tool = WikipediaTool::new(&config);
        assert_eq!(tool.endpoint, "https://de.wikipedia.org/w/api.php");
        assert!(tool.fails_soft());
    }
}
