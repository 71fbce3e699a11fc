use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_query")]
    pub query: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Snapshot time-to-live in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u64,

    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Upper bound in seconds for a detached background refill.
    #[serde(default = "default_background_deadline")]
    pub background_deadline: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::NotFound(path.as_ref().display().to_string()))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        crate::news::fetcher::validate_base_url(&self.upstream.base_url)?;

        if self.upstream.max_results == 0 {
            return Err(ConfigError::Invalid("Max results must be greater than 0".to_string()));
        }

        if self.upstream.query.trim().is_empty() {
            return Err(ConfigError::Invalid("Search query cannot be empty".to_string()));
        }

        if self.cache.ttl == 0 {
            return Err(ConfigError::Invalid("Cache TTL must be greater than 0".to_string()));
        }

        if self.cache.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("Storage key cannot be empty".to_string()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("AI_NEWS_API_KEY") {
            self.upstream.api_key = key;
        }

        if let Ok(url) = std::env::var("AI_NEWS_BASE_URL") {
            self.upstream.base_url = url;
        }

        if let Ok(ttl) = std::env::var("AI_NEWS_TTL") {
            if let Ok(val) = ttl.parse() {
                self.cache.ttl = val;
            }
        }

        if let Ok(level) = std::env::var("AI_NEWS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("ai-news-cache"))
            .ok_or_else(|| ConfigError::Config("Could not determine config directory".to_string()))
    }

    pub fn default_config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory for the persisted snapshot: the configured one, or the
    /// platform cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache.cache_dir {
            return Ok(dir.clone());
        }

        dirs::cache_dir()
            .map(|dir| dir.join("ai-news-cache"))
            .ok_or_else(|| ConfigError::Config("Could not determine cache directory".to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            cache: CacheSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }

    pub fn background_deadline(&self) -> Duration {
        Duration::from_secs(self.background_deadline)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            query: default_query(),
            max_results: default_max_results(),
            lookback_days: default_lookback_days(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            storage_key: default_storage_key(),
            cache_dir: None,
            background_deadline: default_background_deadline(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_base_url() -> String { "https://news.deepsearch.com/api".to_string() }
fn default_query() -> String {
    r#"AI OR 인공지능 OR "artificial intelligence" OR "machine learning" OR "deep learning" OR ChatGPT OR OpenAI OR 딥러닝"#.to_string()
}
fn default_max_results() -> usize { 12 }
fn default_lookback_days() -> u32 { 7 }
fn default_timeout() -> u64 { 10 }
fn default_user_agent() -> String {
    format!("ai-news-cache/{}", env!("CARGO_PKG_VERSION"))
}

fn default_ttl() -> u64 { 30 * 60 }
fn default_storage_key() -> String { "news-cache".to_string() }
fn default_background_deadline() -> u64 { 15 }

fn default_log_level() -> String { "info".to_string() }
