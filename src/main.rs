//! AI Morning Brief binary entrypoint.
//!
//! Runs one daily acquisition pass (two news sections) and writes the
//! aggregate brief as JSON for the rendering/delivery layer.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_morning_brief::backend::GeminiBackend;
use ai_morning_brief::config::SectionsConfig;
use ai_morning_brief::history::HistoryStore;
use ai_morning_brief::pipeline::{self, SectionPipeline};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Output path for the brief JSON ("-" for stdout)
    #[arg(short, long, default_value = "brief.json")]
    output: String,

    /// History log file used for dedup
    #[arg(long, default_value = "data/news_history.json")]
    history: String,

    /// Retrieval attempts per section
    #[arg(long, default_value_t = pipeline::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: usize,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = ai_morning_brief::backend::gemini::DEFAULT_MODEL)]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env-backed args; no-op when absent.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();

    let cli = Cli::parse();

    let sections = SectionsConfig::load_default().context("loading sections config")?;
    let backend = GeminiBackend::new(cli.gemini_api_key.clone(), Some(&cli.model));
    let mut history = HistoryStore::open(&cli.history);

    let pipeline = SectionPipeline::new(&backend, &sections);
    let brief = pipeline
        .build_brief(&mut history, cli.max_attempts, chrono::Utc::now())
        .await;

    if brief.public_sector.failed || brief.tech_industry.failed {
        warn!("one or more sections carry a placeholder record");
    }

    let json = serde_json::to_string_pretty(&brief)?;
    if cli.output == "-" {
        println!("{json}");
    } else {
        if let Some(parent) = Path::new(&cli.output).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        fs::write(&cli.output, &json).with_context(|| format!("writing {}", cli.output))?;
        info!(path = %cli.output, date = %brief.date, "brief written");
    }

    Ok(())
}
