pub mod fallback;
pub mod fetcher;
pub mod normalizer;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A normalized news record, as handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub url: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Category,
}

impl NewsItem {
    /// Case-insensitive keyword match over title, summary and tags.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }

        self.title.to_lowercase().contains(&needle)
            || self.summary.to_lowercase().contains(&needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Closed set of labels the classifier can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "OpenAI")]
    OpenAi,
    #[serde(rename = "Google")]
    Google,
    #[serde(rename = "Meta")]
    Meta,
    #[serde(rename = "Microsoft")]
    Microsoft,
    #[serde(rename = "의료 AI")]
    Medical,
    #[serde(rename = "NVIDIA")]
    Nvidia,
    #[serde(rename = "하드웨어")]
    Hardware,
    #[serde(rename = "오픈소스")]
    OpenSource,
    #[serde(rename = "AI 뉴스")]
    General,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::OpenAi,
        Category::Google,
        Category::Meta,
        Category::Microsoft,
        Category::Medical,
        Category::Nvidia,
        Category::Hardware,
        Category::OpenSource,
        Category::General,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::OpenAi => "OpenAI",
            Category::Google => "Google",
            Category::Meta => "Meta",
            Category::Microsoft => "Microsoft",
            Category::Medical => "의료 AI",
            Category::Nvidia => "NVIDIA",
            Category::Hardware => "하드웨어",
            Category::OpenSource => "오픈소스",
            Category::General => "AI 뉴스",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::Invalid(format!("Unknown category: {}", wanted)))
    }
}

/// Everything that is cached, replaced as one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "news")]
    pub items: Vec<NewsItem>,
}

impl CacheSnapshot {
    pub fn new(last_updated: DateTime<Utc>, items: Vec<NewsItem>) -> Self {
        Self { last_updated, items }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_updated
    }

    /// Stale once the snapshot is at least `ttl` old.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: std::time::Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => self.age(now) >= ttl,
            Err(_) => false,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// One record as returned by the search API; its shape is not fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord(pub Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    pub since: NaiveDate,
}
