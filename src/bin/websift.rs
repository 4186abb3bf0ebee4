//! CLI binary for websift.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use websift::models::{HttpRelevanceScorer, OpenAiChatGenerator, OpenAiEmbedder};
use websift::synthesis::{self, Assistant, ParaphraseMode};
use websift::{RankedResult, RetrievalPipeline, TextGenerator, WebsiftConfig};

/// websift: search the web and answer from what it finds.
#[derive(Parser)]
#[command(name = "websift", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fan out a query over the search backends and print candidate URLs.
    Search {
        /// Query variants; each is searched on every backend.
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Retrieve the most relevant, diverse passages for a query.
    Retrieve {
        query: String,

        /// Paraphrase the query into several focused variants first.
        #[arg(long)]
        expand: bool,
    },

    /// Answer a single question.
    Ask { query: String },

    /// Interactive question answering with conversation history.
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("websift=info,websift_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Search { queries } => run_search(&config, &queries).await,
        Command::Retrieve { query, expand } => run_retrieve(&config, &query, expand).await,
        Command::Ask { query } => run_ask(config, &query).await,
        Command::Chat => run_chat(config).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<WebsiftConfig> {
    if let Some(path) = path {
        return WebsiftConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    let default_path = WebsiftConfig::default_config_path();
    if default_path.exists() {
        tracing::debug!(path = %default_path.display(), "using default config");
        return WebsiftConfig::from_file(&default_path)
            .with_context(|| format!("failed to load config from {}", default_path.display()));
    }
    Ok(WebsiftConfig::default())
}

fn build_pipeline(config: &WebsiftConfig) -> anyhow::Result<RetrievalPipeline> {
    let scorer = Arc::new(HttpRelevanceScorer::new(&config.models.scorer)?);
    let embedder = Arc::new(OpenAiEmbedder::new(&config.models.embedder)?);
    Ok(RetrievalPipeline::new(config, scorer, embedder)?)
}

fn build_generator(config: &WebsiftConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> =
        Arc::new(OpenAiChatGenerator::new(&config.models.generator)?);
    Ok(generator)
}

async fn run_search(config: &WebsiftConfig, queries: &[String]) -> anyhow::Result<()> {
    config.validate()?;
    let search = config.search_config()?;
    let report = websift_search::search(queries, &search).await?;
    for hit in report.candidates.hits() {
        println!("{}", hit.url);
    }
    for failure in &report.failures {
        eprintln!(
            "warning: {} failed for variant {}: {}",
            failure.provider, failure.variant, failure.error
        );
    }
    Ok(())
}

async fn run_retrieve(config: &WebsiftConfig, query: &str, expand: bool) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let variants = if expand {
        let generator = build_generator(config)?;
        synthesis::search_variants(generator.as_ref(), query, ParaphraseMode::Expand).await
    } else {
        Vec::new()
    };
    let results = pipeline.retrieve(query, &variants).await?;
    print_results(&results);
    Ok(())
}

async fn run_ask(config: WebsiftConfig, query: &str) -> anyhow::Result<()> {
    let mut assistant = build_assistant(&config)?;
    let reply = assistant.ask(query).await?;
    println!("{}", reply.answer);
    Ok(())
}

async fn run_chat(config: WebsiftConfig) -> anyhow::Result<()> {
    let mut assistant = build_assistant(&config)?;
    println!("websift v{}", env!("CARGO_PKG_VERSION"));
    println!("Ask a question. /reset clears history, /quit exits.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                assistant.clear_history();
                println!("History cleared.\n");
            }
            query => match assistant.ask(query).await {
                Ok(reply) => println!("\n{}\n", reply.answer),
                Err(e) => {
                    tracing::error!(error = %e, "question failed");
                    println!("\nSorry, something went wrong: {e}\n");
                }
            },
        }
    }
    Ok(())
}

fn build_assistant(config: &WebsiftConfig) -> anyhow::Result<Assistant> {
    Ok(Assistant::new(
        build_pipeline(config)?,
        build_generator(config)?,
        config.assistant.paraphrase_mode,
        config.assistant.max_history_turns,
    ))
}

fn print_results(results: &[RankedResult]) {
    if results.is_empty() {
        println!("No relevant information found.");
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "#{} [{:.3}] {}\n{}\n",
            rank + 1,
            result.mmr_score,
            result.source_url,
            result.text
        );
    }
}
