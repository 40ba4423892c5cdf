mod ingest;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use quarry_core::agent::{Agent, LlmReasoner};
use quarry_core::config::Config;
use quarry_core::pipeline::RagPipeline;
use quarry_index::VectorIndex;
use quarry_llm::{CommandProvider, LlmProvider};
use quarry_tools::{RetrieverTool, ToolRegistry, WikipediaTool, format_documents};

#[derive(Parser)]
#[command(name = "quarry", version)]
#[command(about = "Answer questions over your documents with a tool-using agent")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a directory of documents and answer a question
    Ask {
        /// Directory of .txt and .md files to index
        #[arg(long)]
        docs: PathBuf,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        question: String,
    },

    /// Index a directory of documents and print the passages nearest to a query
    Search {
        /// Directory of .txt and .md files to index
        #[arg(long)]
        docs: PathBuf,

        /// Number of passages to return
        #[arg(short, long)]
        k: Option<usize>,

        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let provider = Arc::new(create_provider(&config)?);
    let index = Arc::new(VectorIndex::new(Arc::clone(&provider)));

    match cli.command {
        Command::Ask {
            docs,
            json,
            question,
        } => {
            build_index(&index, &docs, &config).await?;
            let pipeline = create_pipeline(&config, &provider, &index)?;
            let state = pipeline.run(&question).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!("{}", state.answer().unwrap_or(quarry_core::NO_ANSWER));
            }
        }
        Command::Search { docs, k, query } => {
            build_index(&index, &docs, &config).await?;
            let k = k.unwrap_or(config.index.default_k);
            let found = index.retrieve(&query, k).await?;
            println!(
                "{}",
                format_documents(&found, config.tools.retriever.max_results.max(k))
            );
        }
    }

    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("QUARRY_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn create_provider(config: &Config) -> anyhow::Result<CommandProvider> {
    let provider = CommandProvider::new(
        config.llm.chat_command.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    )?
    .with_embed_command(config.llm.embed_command.clone())?;
    Ok(provider)
}

async fn build_index<P: LlmProvider + 'static>(
    index: &VectorIndex<P>,
    docs: &Path,
    config: &Config,
) -> anyhow::Result<()> {
    let documents = ingest::load_documents(docs).await?;
    if documents.is_empty() {
        bail!("no .txt or .md documents found in {}", docs.display());
    }
    let chunks = ingest::split_documents(
        &documents,
        config.index.chunk_size,
        config.index.chunk_overlap,
    );
    index.build(chunks).await?;
    Ok(())
}

fn create_tools<P: LlmProvider + 'static>(
    config: &Config,
    index: &Arc<VectorIndex<P>>,
) -> anyhow::Result<ToolRegistry> {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(RetrieverTool::new(
        Arc::clone(index),
        &config.tools.retriever,
    )))?;
    if config.tools.wikipedia.enabled {
        tools.register(Arc::new(WikipediaTool::new(&config.tools.wikipedia)))?;
    }
    Ok(tools)
}

fn create_pipeline<P: LlmProvider + 'static>(
    config: &Config,
    provider: &Arc<P>,
    index: &Arc<VectorIndex<P>>,
) -> anyhow::Result<RagPipeline<P, LlmReasoner<P>>> {
    let tools = create_tools(config, index)?;
    tracing::debug!(?tools, "tools registered");

    let mut reasoner = LlmReasoner::new(Arc::clone(provider));
    if let Some(prompt) = &config.agent.system_prompt {
        reasoner = reasoner.with_system_prompt(prompt.clone());
    }
    let agent = Agent::new(reasoner, Arc::new(tools), &config.agent);

    Ok(RagPipeline::new(
        Arc::clone(index),
        Arc::new(agent),
        config.index.default_k,
    ))
}
