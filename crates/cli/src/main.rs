mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackprep_core::{
    analyze_release, enhance_source, load_config, metrics, read_torrent, validate_config,
    CatalogMatcher, Config, ContentProber, ExtractionItem, Extractor, FfprobeProber,
    FilenameAnalyzer, MatchCache, NamingContext, SanitizedConfig, TmdbClient,
};

use cli::{CacheAction, Cli, Commands};

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "TRACKPREP_CONFIG";
const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "debug,reqwest=info,hyper=info"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = load(&config_path)?;
    debug!(config = ?SanitizedConfig::from(&config), "Configuration loaded");

    match cli.command {
        Commands::Analyze {
            name,
            category,
            path,
        } => analyze(&config, &name, &category, path.as_deref()).await,
        Commands::Match {
            name,
            category,
            path,
        } => match_one(&config, &name, &category, path.as_deref()).await,
        Commands::Batch {
            list,
            category,
            metrics,
        } => batch(&config, &list, &category, metrics).await,
        Commands::Torrent { file, category } => torrent(&config, &file, &category).await,
        Commands::Cache { action } => cache(&config, action),
    }
}

/// Load the config file, or defaults plus environment when it does not exist.
fn load(path: &Path) -> Result<Config> {
    if path.exists() {
        info!("Loading configuration from {:?}", path);
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        info!(
            "No config file at {:?}, using defaults and environment",
            path
        );
        Config::from_env().context("Failed to read configuration from environment")
    }
}

fn prober(config: &Config) -> Option<FfprobeProber> {
    config
        .probe
        .enabled
        .then(|| FfprobeProber::new(config.probe.clone()))
}

/// Everything that talks to TMDB needs a valid config.
fn matcher(config: &Config) -> Result<CatalogMatcher<TmdbClient>> {
    validate_config(config).context("Configuration validation failed")?;
    let client = TmdbClient::new(&config.tmdb).context("Failed to create TMDB client")?;
    let cache = MatchCache::from_config(&config.cache);
    info!(
        cache = %cache.path().display(),
        entries = cache.len(),
        "Catalog matcher ready"
    );
    Ok(CatalogMatcher::new(client, cache))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

async fn analyze(config: &Config, name: &str, category: &str, path: Option<&Path>) -> Result<()> {
    let analyzer = FilenameAnalyzer::from_config(&config.analyzer);
    let prober = prober(config);
    let info = analyze_release(
        &analyzer,
        prober.as_ref().map(|p| p as &dyn ContentProber),
        name,
        category,
        path,
    )
    .await;
    print_json(&info)
}

async fn match_one(config: &Config, name: &str, category: &str, path: Option<&Path>) -> Result<()> {
    let matcher = matcher(config)?;
    let analyzer = FilenameAnalyzer::from_config(&config.analyzer);
    let prober = prober(config);

    let mut info = analyze_release(
        &analyzer,
        prober.as_ref().map(|p| p as &dyn ContentProber),
        name,
        category,
        path,
    )
    .await;

    let matched = matcher.match_media(&info).await;
    if let Some(ref m) = matched {
        info.apply_match(m);
    }
    enhance_source(&mut info, matched.as_ref());
    matcher.close().await;

    print_json(&json!({
        "media": info,
        "tmdb": matched,
        "low_confidence": matched.as_ref().map(|m| m.is_low_confidence()),
    }))
}

/// One release name per line; blank lines and `#` comments are skipped.
fn read_name_list(list: &Path, category: &str) -> Result<Vec<ExtractionItem>> {
    let contents = std::fs::read_to_string(list)
        .with_context(|| format!("Failed to read name list {:?}", list))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| ExtractionItem::new(line, category))
        .collect())
}

async fn batch(config: &Config, list: &Path, category: &str, show_metrics: bool) -> Result<()> {
    let items = read_name_list(list, category)?;
    if items.is_empty() {
        warn!("No names found in {:?}", list);
    }

    let mut extractor = Extractor::new(
        FilenameAnalyzer::from_config(&config.analyzer),
        matcher(config)?,
    );
    if let Some(prober) = prober(config) {
        extractor = extractor.with_prober(Box::new(prober));
    }

    let report = extractor.extract_all(&items).await;
    extractor.close().await;

    print_json(&report)?;
    if show_metrics {
        print!("{}", metrics::gather_text());
    }
    Ok(())
}

async fn torrent(config: &Config, file: &Path, category: &str) -> Result<()> {
    let torrent = read_torrent(file)
        .with_context(|| format!("Failed to read torrent {:?}", file))?
        .with_category(category);
    info!(name = %torrent.name, files = torrent.files.len(), "Torrent loaded");

    let matcher = matcher(config)?;
    let analyzer = FilenameAnalyzer::from_config(&config.analyzer);
    let mut info = analyzer.analyze(&torrent.name, &torrent.category);

    let matched = matcher.match_media(&info).await;
    if let Some(ref m) = matched {
        info.apply_match(m);
    }
    enhance_source(&mut info, matched.as_ref());
    matcher.close().await;

    let context = NamingContext::from_config(&config.naming).build(&info, &torrent, matched.as_ref());
    print_json(&context)
}

fn cache(config: &Config, action: CacheAction) -> Result<()> {
    let mut cache = MatchCache::from_config(&config.cache);
    match action {
        CacheAction::Stats => print_json(&cache.stats()),
        CacheAction::Clear => {
            cache.clear().context("Failed to clear match cache")?;
            println!("Cache cleared: {}", cache.path().display());
            Ok(())
        }
    }
}
