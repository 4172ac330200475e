//! scrapemdb command line
//!
//! Harvests one or more title pages into `Scraped/`, optionally collecting
//! them into a list.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use scrapemdb_core::{
    collect_targets, ClientConfig, EntityHarvester, EpisodeBound, HarvestConfig, HttpNavigator,
    ListMode, MediaType, OutputLayout, RunOptions, Runner, Schema,
};

#[derive(Parser, Debug)]
#[command(name = "scrapemdb")]
#[command(about = "Harvest movie and series pages into static JSON documents")]
#[command(version)]
#[command(group(ArgGroup::new("list_mode").args(["list", "append"])))]
struct Cli {
    /// Target URL(s)
    targets: Vec<String>,

    /// Text file with one target per line
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Create a new list with this name
    #[arg(short, long, value_name = "NAME")]
    list: Option<String>,

    /// Append to an existing list folder
    #[arg(short, long, value_name = "PATH")]
    append: Option<PathBuf>,

    /// Force the media type instead of detecting it
    #[arg(short = 't', long = "type", value_name = "movie|series")]
    media_type: Option<MediaType>,

    /// Skip reviews and parental guide
    #[arg(long)]
    fast: bool,

    /// Try to load all reviews (slower)
    #[arg(short = 'r')]
    all_reviews: bool,

    /// Field-to-selector schema
    #[arg(long, value_name = "PATH", default_value = "schema.json")]
    schema: PathBuf,

    /// Output root
    #[arg(long, value_name = "DIR", default_value = scrapemdb_core::layout::DEFAULT_ROOT)]
    output: PathBuf,

    /// Additional field whose absence is not reported
    #[arg(long, value_name = "FIELD")]
    silent: Vec<String>,

    /// Wait for each element lookup, in seconds
    #[arg(long, value_name = "SECS", default_value = "0", value_parser = parse_seconds)]
    timeout: Duration,

    /// Maximum requests per second
    #[arg(long, value_name = "N", default_value_t = 2.0, value_parser = parse_rate)]
    rps: f64,

    /// Follow "next episode" past the declared count, up to N episodes
    #[arg(long, value_name = "N")]
    episode_cap: Option<usize>,
}

fn parse_seconds(value: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if secs < 0.0 {
        return Err("must not be negative".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

fn parse_rate(value: &str) -> std::result::Result<f64, String> {
    let rate: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if !(rate.is_finite() && rate > 0.0) {
        return Err("must be a positive number".to_string());
    }
    Ok(rate)
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("scrapemdb=info".parse()?),
        )
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let targets = collect_targets(&cli.targets, cli.file.as_deref())
        .context("failed to collect targets")?;

    if targets.is_empty() && cli.list.is_none() {
        warn!("No targets provided. Use --help for usage.");
        return Ok(ExitCode::SUCCESS);
    }

    let schema = Schema::load(&cli.schema)
        .with_context(|| format!("failed to load schema {}", cli.schema.display()))?;
    if schema.is_empty() {
        warn!(path = %cli.schema.display(), "schema has no fields, every value will be missing");
    }
    info!(fields = schema.len(), path = %cli.schema.display(), "schema loaded");

    let mut config = HarvestConfig {
        lookup_timeout: cli.timeout,
        ..HarvestConfig::default()
    };
    config.silent_fields.extend(cli.silent.iter().cloned());
    if let Some(max) = cli.episode_cap {
        config.episode_bound = EpisodeBound::FollowChain { max };
    }

    let list = match (&cli.list, &cli.append) {
        (Some(name), _) => ListMode::New(name.clone()),
        (None, Some(path)) => ListMode::Append(path.clone()),
        (None, None) => ListMode::None,
    };
    let options = RunOptions {
        targets,
        media_type: cli.media_type,
        fast: cli.fast,
        enhanced_reviews: cli.all_reviews,
        list,
    };

    let client_config = ClientConfig {
        requests_per_second: cli.rps,
        ..ClientConfig::default()
    };
    let navigator = match start_session(client_config) {
        Ok(navigator) => navigator,
        Err(e) => {
            error!("Session initialization failed: {}", e);
            return Ok(ExitCode::from(1));
        }
    };
    info!("Session online");

    let harvester = EntityHarvester::new(
        navigator,
        Arc::new(schema),
        config,
        OutputLayout::new(&cli.output),
    );
    let summary = Runner::new(harvester).run(&options).await?;

    println!(
        "Operations complete: {} harvested, {} failed, {} skipped",
        summary.harvested, summary.failed, summary.skipped
    );
    Ok(ExitCode::SUCCESS)
}

fn start_session(config: ClientConfig) -> scrapemdb_core::Result<HttpNavigator> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );
    spinner.set_message("Starting session...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let navigator = HttpNavigator::start(config);

    spinner.finish_and_clear();
    navigator
}
