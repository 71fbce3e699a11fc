pub mod commands;

use clap::{Parser, Subcommand};
use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ai-news-cache")]
#[command(about = "Cached AI news feed backed by a news search API")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the front page selection
    FrontPage {
        /// Print items as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all cached news
    List {
        /// Only items in this category (e.g. "Google", "하드웨어")
        #[arg(long)]
        category: Option<String>,

        /// Only items mentioning this keyword
        #[arg(long)]
        search: Option<String>,

        /// Print items as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop the cache and fetch fresh news now
    Refresh,

    /// Show cache status
    Status,

    /// Drop the cached snapshot
    Invalidate,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let (debug, verbose) = (self.debug, self.verbose);

        match self.command {
            Commands::Init { force } => {
                commands::init_logging(debug, verbose, None)?;
                commands::init(self.config, force).await
            }
            Commands::FrontPage { json } => {
                let config = prepare(self.config, debug, verbose)?;
                commands::front_page(&config, json).await
            }
            Commands::List { category, search, json } => {
                let config = prepare(self.config, debug, verbose)?;
                commands::list(&config, category, search, json).await
            }
            Commands::Refresh => {
                let config = prepare(self.config, debug, verbose)?;
                commands::refresh(&config).await
            }
            Commands::Status => {
                let config = prepare(self.config, debug, verbose)?;
                commands::status(&config).await
            }
            Commands::Invalidate => {
                let config = prepare(self.config, debug, verbose)?;
                commands::invalidate(&config).await
            }
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn prepare(config_path: Option<PathBuf>, debug: bool, verbose: bool) -> Result<Config> {
    let config = commands::load_config(config_path)?;
    commands::init_logging(debug, verbose, Some(&config.logging))?;
    Ok(config)
}
