//! Tools for the quarry reasoning agent and the registry that dispatches them.

pub mod config;
pub mod error;
pub mod registry;
pub mod retriever;
pub mod tool;
pub mod wikipedia;

pub use config::{RetrieverConfig, ToolsConfig, WikipediaConfig};
pub use error::ToolError;
pub use registry::{ToolRegistry, format_specs};
pub use retriever::{RETRIEVER_TOOL_NAME, RetrieverTool, format_documents};
pub use tool::{FnTool, Tool, ToolSpec};
pub use wikipedia::{WIKIPEDIA_TOOL_NAME, WikipediaTool};
