//! CLI binary for Kenning.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use futures_util::StreamExt;
use kenning::answer::AnswerAssembler;
use kenning::credentials::{Credential, StaticTokenStore};
use kenning::generation::{OpenAiGenerator, TextGenerator};
use kenning::{KenningConfig, PersonalizedSearch};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// User id used for the personal corpus when `--user` is not given.
const LOCAL_USER: &str = "local";

/// Kenning: personalised web search with cited, streamed answers.
#[derive(Parser)]
#[command(name = "kenning", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User whose personal corpus should be searched.
    #[arg(short, long)]
    user: Option<String>,

    /// Number of results to gather.
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Expert domain (technology, finance, science, health, business,
    /// policy, academic, environment).
    #[arg(short, long)]
    expert: Option<String>,

    /// Notion integration token for the personal corpus.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    notion_token: Option<String>,

    /// The question to answer.
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // stdout carries the answer, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kenning=info,kenning_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let query = cli.query.join(" ");
    let count = cli.count.unwrap_or(config.search.max_results);

    let generator: Arc<dyn TextGenerator> =
        Arc::new(OpenAiGenerator::from_config(&config.generation)?);
    let user = cli
        .user
        .clone()
        .or_else(|| cli.notion_token.as_ref().map(|_| LOCAL_USER.to_string()));
    let tokens = Arc::new(StaticTokenStore::new(cli.notion_token.map(Credential::new)));
    let service = PersonalizedSearch::from_config(&config, Arc::clone(&generator), tokens)?;

    let response = match cli.expert.as_deref() {
        Some(mode) => service.search_expert(&query, mode, count).await,
        None => service.search(&query, count, user.as_deref()).await,
    };
    info!(
        request_id = %response.request_id,
        sources = response.citations.len(),
        "search finished"
    );

    if response.expanded_queries.len() > 1 {
        println!("Searched: {}", response.expanded_queries.join(" | "));
    }
    println!("Sources:");
    for entry in response.citations.entries() {
        println!("  [{}] {}\n      {}", entry.index, entry.title, entry.url);
    }
    println!();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let assembler = AnswerAssembler::new(generator, &config.generation);
    let mut answer = assembler.stream_answer(&query, &response.results, cancel.clone());
    let mut stdout = std::io::stdout();
    let mut failed = false;
    while let Some(chunk) = answer.next().await {
        write!(stdout, "{}", chunk.text)?;
        stdout.flush()?;
        if chunk.is_final {
            failed = chunk.is_error();
        }
    }
    writeln!(stdout)?;

    if cancel.is_cancelled() {
        info!("answer cancelled");
        return Ok(ExitCode::from(130));
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<KenningConfig> {
    let mut config = match path {
        Some(path) => KenningConfig::from_file(path)?,
        None => {
            let default_path = KenningConfig::default_config_path();
            if default_path.exists() {
                KenningConfig::from_file(&default_path)?
            } else {
                KenningConfig::default()
            }
        }
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}
