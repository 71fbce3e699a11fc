use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, warn};

use crate::cli::Cli;
use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use crate::news::{Category, NewsItem};
use crate::storage::NewsRepository;

/// Write a default configuration file.
pub async fn init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = get_config_file(config_path)?;

    if path.exists() && !force {
        return Err(Error::Invalid(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;
    println!("✓ Wrote configuration to {}", path.display());
    println!("  Set upstream.api_key or AI_NEWS_API_KEY before fetching news.");
    Ok(())
}

pub async fn front_page(config: &Config, json: bool) -> Result<()> {
    let repo = NewsRepository::from_config(config).await?;
    let items = repo.front_page_items().await;
    print_items(&items, json)?;

    finish(&repo).await;
    Ok(())
}

pub async fn list(
    config: &Config,
    category: Option<String>,
    search: Option<String>,
    json: bool,
) -> Result<()> {
    let category = category.map(|c| c.parse::<Category>()).transpose()?;
    let repo = NewsRepository::from_config(config).await?;

    let mut items = match category {
        Some(category) => repo.items_by_category(category).await,
        None => repo.all_items().await,
    };
    if let Some(keyword) = search {
        items.retain(|item| item.matches_keyword(&keyword));
    }

    print_items(&items, json)?;

    finish(&repo).await;
    Ok(())
}

pub async fn refresh(config: &Config) -> Result<()> {
    let repo = NewsRepository::from_config(config).await?;

    match repo.force_refresh().await {
        Ok(items) => {
            println!("✓ Refreshed news cache: {} items", items.len());
            Ok(())
        }
        Err(e) => {
            warn!("Refresh failed: {}", e);
            if e.is_temporary() {
                println!("  The news source may be briefly unavailable; reads keep serving fallback items.");
            }
            Err(e)
        }
    }
}

pub async fn status(config: &Config) -> Result<()> {
    let repo = NewsRepository::from_config(config).await?;
    let status = repo.status();

    println!("📰 News cache status");
    println!("==================");
    println!("Cache directory: {}", config.cache_dir()?.display());
    println!("TTL: {} minutes", config.cache.ttl / 60);

    if !status.present {
        println!("Snapshot: none");
        return Ok(());
    }

    match status.last_updated {
        Some(_) if status.is_seeded() => println!("Last updated: never (built-in sample items)"),
        Some(updated) => println!("Last updated: {}", format_time(updated)),
        None => {}
    }
    println!("Items: {}", status.count);
    println!("State: {}", if status.stale { "stale" } else { "fresh" });
    Ok(())
}

pub async fn invalidate(config: &Config) -> Result<()> {
    let repo = NewsRepository::from_config(config).await?;
    repo.invalidate().await;
    println!("✓ News cache invalidated");
    Ok(())
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

/// Explicit path, then the default config file, then defaults plus env.
pub fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = config_path {
        return Config::load_with_env(path);
    }

    let default_path = Config::default_config_file()?;
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Config::load_with_env(default_path)
    } else {
        Config::from_env()
    }
}

pub fn init_logging(debug: bool, verbose: bool, logging: Option<&LoggingConfig>) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else if let Some(logging) = logging {
        EnvFilter::try_new(&logging.level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", logging.level, e)))?
    } else {
        EnvFilter::new("warn")
    };

    let json = logging.map(|l| l.json_format).unwrap_or(false);
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(())
}

/// Let a pending background refill land before the process exits.
async fn finish(repo: &NewsRepository) {
    repo.cache().wait_for_background_refill().await;

    let stats = repo.stats();
    debug!(
        "Cache reads: {} fresh, {} stale (hit rate {:.0}%), {} refills, {} failed",
        stats.fresh_hits,
        stats.stale_reads,
        stats.hit_rate() * 100.0,
        stats.refills,
        stats.refill_failures
    );
}

fn get_config_file(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => Config::default_config_file(),
    }
}

fn print_items(items: &[NewsItem], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No news items.");
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        println!("{:>2}. [{}] {}", i + 1, item.category, item.title);
        println!("    {} · {}", item.source, format_time(item.published_at));
        println!("    {}", item.summary);
        if item.url != "#" {
            println!("    {}", item.url);
        }
        if !item.tags.is_empty() {
            println!("    tags: {}", item.tags.join(", "));
        }
        println!();
    }
    Ok(())
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
