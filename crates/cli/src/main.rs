use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use stackscan_cleaner::providers::OpenAiProvider;
use stackscan_cleaner::{CompletionClient, LlmCleaner, LlmSettings, RetryPolicy, RuleCleaner};
use stackscan_config::{load_config, CleanerBackend, Config};
use stackscan_core::FrameCleaner;
use stackscan_pipeline::PipelineDriver;
use stackscan_store::{FrameReader, RecordWriter};

#[derive(Parser)]
#[command(name = "stackscan")]
#[command(about = "Clean poker broadcast OCR dumps into structured player/chip records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Llm,
    Rule,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cleaning pipeline over a raw OCR JSONL dump
    Clean {
        /// Input file: one raw frame observation per line
        #[arg(short, long)]
        input: PathBuf,
        /// Output file: one cleaned record per line (overwritten)
        #[arg(short, long)]
        output: PathBuf,
        /// Config file path
        #[arg(short, long, default_value = "stackscan.toml")]
        config: PathBuf,
        /// Cleaning backend, overriding the config
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
        /// Model identifier, overriding the config
        #[arg(long)]
        model: Option<String>,
        /// Minimum delay between service calls in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Maximum attempts per frame, including the first
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Env var holding the service credential, used when the config
        /// does not carry one
        #[arg(long, default_value = "OPENAI_API_KEY")]
        api_key_env: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            input,
            output,
            config,
            backend,
            model,
            delay_ms,
            max_attempts,
            api_key_env,
        } => {
            let mut config = load_config(&config)?;
            if let Some(backend) = backend {
                config.cleaner = match backend {
                    BackendArg::Llm => CleanerBackend::Llm,
                    BackendArg::Rule => CleanerBackend::Rule,
                };
            }
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(delay_ms) = delay_ms {
                config.llm.min_interval_ms = delay_ms;
            }
            if let Some(max_attempts) = max_attempts {
                config.retry.max_attempts = max_attempts;
            }

            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
                )
                .init();

            run_clean(&config, &input, &output, &api_key_env).await?;
        }
    }

    Ok(())
}

async fn run_clean(
    config: &Config,
    input: &PathBuf,
    output: &PathBuf,
    api_key_env: &str,
) -> Result<()> {
    info!(
        input = %input.display(),
        output = %output.display(),
        backend = ?config.cleaner,
        "Starting stackscan"
    );

    let cleaner = build_cleaner(config, api_key_env)?;

    let reader = FrameReader::open(input)
        .with_context(|| format!("Cannot open input file {}", input.display()))?;
    let mut writer = RecordWriter::create(output)
        .with_context(|| format!("Cannot create output file {}", output.display()))?;

    let driver = PipelineDriver::new(cleaner);
    let summary = driver.run(&reader, &mut writer).await?;

    println!("{summary}");
    Ok(())
}

fn build_cleaner(config: &Config, api_key_env: &str) -> Result<Arc<dyn FrameCleaner>> {
    match config.cleaner {
        CleanerBackend::Rule => Ok(Arc::new(RuleCleaner::new())),
        CleanerBackend::Llm => {
            let api_key = if let Some(key) = &config.llm.api_key {
                key.clone()
            } else {
                match std::env::var(api_key_env) {
                    Ok(key) if !key.is_empty() => key,
                    _ => bail!(
                        "No API key: set {api_key_env} or configure llm.api_key \
                         (e.g. \"${{{api_key_env}}}\")"
                    ),
                }
            };

            let provider_name = if config.llm.api_base.contains("deepseek") {
                "deepseek"
            } else {
                "openai"
            };
            let provider = OpenAiProvider::new(api_key)
                .with_base_url(config.llm.api_base.clone())
                .with_name(provider_name);

            let policy = RetryPolicy {
                max_attempts: config.retry.max_attempts,
                base_delay_ms: config.retry.base_delay_ms,
                backoff_factor: config.retry.backoff_factor,
                max_delay_ms: config.retry.max_delay_ms,
                jitter: config.retry.jitter,
            };
            let client = CompletionClient::new(Arc::new(provider), policy)
                .with_min_interval(Duration::from_millis(config.llm.min_interval_ms));

            let settings = LlmSettings {
                model: config.llm.model.clone(),
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            };
            Ok(Arc::new(LlmCleaner::new(client, settings)))
        }
    }
}
