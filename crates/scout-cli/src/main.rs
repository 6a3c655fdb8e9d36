//! `scout`: scrape public developer and designer profiles into JSON.
//!
//! Profiles are written to stdout as a JSON array. Every diagnostic goes to
//! stderr so the output can be piped straight into another program.

use anyhow::{Context, Result};
use clap::Parser;
use scout_browser::{BrowserEngine, LaunchOptions};
use scout_core::{AppConfig, LogFormat, LoggingConfig, ScrapeRequest};
use scout_scraper::{
    NoDelay, PlatformRegistry, RandomThrottler, ScrapeOrchestrator, ThrottlePolicy, Throttler,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scrape candidate profiles from GitHub, Behance, Stack Overflow or Dev.to.
#[derive(Parser, Debug)]
#[command(name = "scout", version)]
#[command(about = "Scrape public profiles and print them as JSON", long_about = None)]
struct Args {
    /// Platform to scrape: github, behance, stackoverflow or devto
    #[arg(long)]
    platform: Option<String>,

    /// Free-text search query
    #[arg(long)]
    query: Option<String>,

    /// Location filter (GitHub and Behance only)
    #[arg(long)]
    location: Option<String>,

    /// Maximum number of profiles to return
    #[arg(long = "max")]
    max_profiles: Option<usize>,

    /// JSON array of profile URLs to skip, e.g. '["https://github.com/octocat"]'
    #[arg(long)]
    existing: Option<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Disable pacing delays between browser actions
    #[arg(long, default_value_t = false)]
    no_throttle: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_path) = load_config(&args)?;
    config.apply_env_overrides();
    init_tracing(&config.logging);
    // Loading ran before the subscriber existed
    debug!(
        path = %config_path.display(),
        found = config_path.exists(),
        filter = %config.logging.filter,
        "configuration loaded"
    );

    let registry = Arc::new(load_registry(&config)?);
    let throttler: Arc<dyn Throttler> = if config.scraping.throttle && !args.no_throttle {
        Arc::new(RandomThrottler::new(ThrottlePolicy::from_registry(&registry)))
    } else {
        info!("throttling disabled");
        Arc::new(NoDelay)
    };
    let engine = BrowserEngine::new(LaunchOptions {
        headless: config.browser.headless,
        chrome_executable: config.browser.chrome_executable.clone(),
        args: config.browser.extra_args.clone(),
    });

    let orchestrator = ScrapeOrchestrator::new(registry, Arc::new(engine), throttler)
        .with_viewport(config.browser.viewport_width, config.browser.viewport_height);

    let request = build_request(&args, &config);
    let report = orchestrator.run(&request).await;
    if let Some(error) = &report.error {
        warn!(platform = %report.platform, "{error}");
    }

    let json = if args.compact {
        serde_json::to_string(&report.profiles)?
    } else {
        serde_json::to_string_pretty(&report.profiles)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;

    Ok(())
}

/// Load the file named by `--config`, or the default one. Also returns the
/// path that was consulted.
fn load_config(args: &Args) -> Result<(AppConfig, PathBuf)> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => AppConfig::config_path().context("locating config file")?,
    };
    let config = AppConfig::load_from(&path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    Ok((config, path))
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true).with_writer(std::io::stderr))
            .init(),
    }
}

fn load_registry(config: &AppConfig) -> Result<PlatformRegistry> {
    let registry = PlatformRegistry::builtin().context("loading built-in platform definitions")?;
    let Some(dir) = &config.scraping.definitions_dir else {
        return Ok(registry);
    };

    match registry.clone().with_overrides_from(dir) {
        Ok(registry) => Ok(registry),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "ignoring platform definition overrides");
            Ok(registry)
        }
    }
}

/// Flags override config values, which override built-in defaults.
fn build_request(args: &Args, config: &AppConfig) -> ScrapeRequest {
    let scraping = &config.scraping;
    ScrapeRequest::new(
        args.platform
            .clone()
            .unwrap_or_else(|| scraping.default_platform.clone()),
    )
    .with_query(
        args.query
            .clone()
            .unwrap_or_else(|| scraping.default_query.clone()),
    )
    .with_location(
        args.location
            .clone()
            .unwrap_or_else(|| scraping.default_location.clone()),
    )
    .with_max_profiles(args.max_profiles.unwrap_or(scraping.default_max_profiles))
    .with_existing_urls(parse_existing(args.existing.as_deref()))
}

/// Parse the `--existing` JSON array. Anything unparsable counts as empty.
fn parse_existing(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(urls) => urls,
        Err(e) => {
            warn!(error = %e, "ignoring unparsable --existing value");
            Vec::new()
        }
    }
}
