use anyhow::{bail, Context};
use clap::Parser;
use sentiment_analyzer::{
    input, report, AnalysisEvent, AnalysisMode, ClientConfig, NormalizedInput,
    OrchestratorBuilder, ProxyClient, DEFAULT_BATCH_SIZE, DEFAULT_MAX_POSTS, DEFAULT_PROXY_URL,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sentiment-analyzer", version, about = "Batch social media posts through an LLM proxy for sentiment analysis")]
struct Cli {
    /// Input .txt or .csv file (reads stdin when neither --input nor --text is given)
    #[arg(long, value_name = "FILE", conflicts_with = "text")]
    input: Option<PathBuf>,

    /// Posts passed directly on the command line
    #[arg(long)]
    text: Option<String>,

    /// Analysis proxy endpoint
    #[arg(long, env = "SENTIMENT_PROXY_URL", default_value = DEFAULT_PROXY_URL)]
    proxy_url: String,

    /// Posts per request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Upper bound on analysed posts; extra posts are dropped with a warning
    #[arg(long, default_value_t = DEFAULT_MAX_POSTS)]
    max_posts: usize,

    /// Send one request per post instead of one per batch
    #[arg(long, default_value_t = false)]
    per_post: bool,

    /// Attempts per post in --per-post mode
    #[arg(long, default_value_t = 2)]
    max_attempts: u32,

    /// Delay before retrying a post, in milliseconds
    #[arg(long, default_value_t = 0)]
    retry_delay_ms: u64,

    /// HTTP timeout in seconds (client default when omitted)
    #[arg(long)]
    timeout: Option<u64>,

    /// Ask the model to write the strategic insights
    #[arg(long, default_value_t = false)]
    model_insights: bool,

    /// Directory for report.html and results.json
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
}

async fn read_input(cli: &Cli) -> anyhow::Result<NormalizedInput> {
    if let Some(path) = &cli.input {
        return Ok(input::load_file(path, cli.max_posts).await?);
    }
    if let Some(text) = &cli.text {
        return Ok(input::normalize_text(text, cli.max_posts));
    }

    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("Failed to read posts from stdin")?;
    Ok(input::normalize_text(&raw, cli.max_posts))
}

/// Prints progress and cards as events arrive.
async fn render_events(mut receiver: mpsc::UnboundedReceiver<AnalysisEvent>) {
    while let Some(event) = receiver.recv().await {
        match event {
            AnalysisEvent::RunStarted { total_posts, batch_count, .. } => {
                eprintln!("Analyzing {} posts in {} batches...", total_posts, batch_count);
            }
            AnalysisEvent::BatchStarted { index, batch_count } => {
                eprintln!("Analyzing batch {} of {}...", index + 1, batch_count);
            }
            AnalysisEvent::BatchCompleted { results, .. } => {
                println!("{}", report::render_cards(&results));
            }
            AnalysisEvent::BatchFailed(failure) => {
                eprintln!("{}", failure.error);
            }
            AnalysisEvent::PostRetried { post_index, attempt, error } => {
                eprintln!("Post {} failed on attempt {} ({}), retrying...", post_index + 1, attempt, error);
            }
            AnalysisEvent::PostFailed { post_index, error } => {
                eprintln!("Post {} could not be analyzed: {}", post_index + 1, error);
            }
            AnalysisEvent::Finalizing => eprintln!("Finalizing report..."),
            AnalysisEvent::RunFinished { .. } => break,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let normalized = read_input(&cli).await?;
    eprintln!("{}", normalized.post_count_info());
    if normalized.is_empty() {
        bail!("Please paste or upload some text to analyze.");
    }

    let client_config = ClientConfig {
        endpoint: cli.proxy_url.clone(),
        timeout_seconds: cli.timeout,
        ..ClientConfig::default()
    };
    let client = ProxyClient::new(&client_config)
        .with_context(|| format!("Invalid proxy configuration for {}", cli.proxy_url))?;

    let (sender, receiver) = mpsc::unbounded_channel();
    let renderer = tokio::spawn(render_events(receiver));

    let mode = if cli.per_post { AnalysisMode::PerPost } else { AnalysisMode::Batched };
    let orchestrator = OrchestratorBuilder::new(Arc::new(client))
        .batch_size(cli.batch_size)
        .max_posts(cli.max_posts)
        .mode(mode)
        .max_attempts(cli.max_attempts)
        .retry_delay_ms(cli.retry_delay_ms)
        .model_insights(cli.model_insights)
        .events(sender)
        .build()?;

    info!("Sending posts to {}", cli.proxy_url);
    let session = match orchestrator.run(&normalized.posts).await {
        Ok(session) => session,
        Err(e) => {
            error!("Analysis error: {}", e);
            return Err(e.into());
        }
    };
    drop(orchestrator);
    if let Err(e) = renderer.await {
        warn!("Progress renderer stopped unexpectedly: {}", e);
    }

    println!("{}", report::render_summary(&session));

    if let Some(out_dir) = &cli.out {
        report::write_outputs(&session, out_dir)
            .await
            .with_context(|| format!("Failed to write outputs to {}", out_dir.display()))?;
        eprintln!("Report written to {}", out_dir.join("report.html").display());
    }

    if !session.is_complete() {
        warn!(
            "{} of {} posts were not analyzed",
            session.submitted_posts - session.results.len(),
            session.submitted_posts
        );
    }
    Ok(())
}
