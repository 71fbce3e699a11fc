//! Conversion of raw search hits into [`NewsItem`]s.
//!
//! The search API has shipped two record shapes: fields wrapped in a
//! `_source` envelope, and the same fields at the top level. Every field is
//! resolved through an ordered list of JSON pointers; the first one holding a
//! usable value wins, otherwise the field's default applies.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::news::{Category, NewsItem, RawRecord};

type FieldPath = &'static [&'static str];

const TITLE: FieldPath = &["/_source/title", "/title"];
const SUMMARY: FieldPath = &["/_source/summary", "/summary"];
const CONTENT: FieldPath = &["/_source/content", "/content"];
const PUBLISHED_AT: FieldPath = &["/_source/published_at", "/published_at"];
const SOURCE: FieldPath = &["/_source/source", "/source"];
const URL: FieldPath = &["/_source/url", "/url"];
const IMAGE_URL: FieldPath = &["/_source/image_url", "/image_url"];
const TAGS: FieldPath = &["/_source/tags", "/tags"];

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_SOURCE: &str = "Unknown";
pub const DEFAULT_URL: &str = "#";
pub const SUMMARY_MAX_CHARS: usize = 200;

struct CategoryRule {
    category: Category,
    title_keywords: &'static [&'static str],
    tag_keywords: &'static [&'static str],
}

// First match wins, so order is the tie-break.
const RULES: [CategoryRule; 8] = [
    CategoryRule {
        category: Category::OpenAi,
        title_keywords: &["openai", "gpt"],
        tag_keywords: &["openai"],
    },
    CategoryRule {
        category: Category::Google,
        title_keywords: &["google"],
        tag_keywords: &["google"],
    },
    CategoryRule {
        category: Category::Meta,
        title_keywords: &["meta", "facebook"],
        tag_keywords: &["meta"],
    },
    CategoryRule {
        category: Category::Microsoft,
        title_keywords: &["microsoft"],
        tag_keywords: &["microsoft"],
    },
    CategoryRule {
        category: Category::Medical,
        title_keywords: &["의료", "medical", "health"],
        tag_keywords: &[],
    },
    CategoryRule {
        category: Category::Nvidia,
        title_keywords: &["nvidia"],
        tag_keywords: &["nvidia"],
    },
    CategoryRule {
        category: Category::Hardware,
        title_keywords: &["chip", "gpu", "칩"],
        tag_keywords: &[],
    },
    CategoryRule {
        category: Category::OpenSource,
        title_keywords: &["오픈소스", "open source"],
        tag_keywords: &[],
    },
];

/// Assign a category from the title and tags.
pub fn classify(title: &str, tags: &[String]) -> Category {
    let title = title.to_lowercase();
    let tags = tags.join(" ").to_lowercase();

    RULES
        .iter()
        .find(|rule| {
            rule.title_keywords.iter().any(|kw| title.contains(kw))
                || rule.tag_keywords.iter().any(|kw| tags.contains(kw))
        })
        .map(|rule| rule.category)
        .unwrap_or(Category::General)
}

/// Normalize one record. `index` is the record's position in the batch and
/// together with `fetch_epoch` makes the id unique within that batch.
pub fn normalize(raw: &RawRecord, index: usize, fetch_epoch: DateTime<Utc>) -> NewsItem {
    let value = raw.value();

    let title = resolve_str(value, TITLE)
        .unwrap_or(DEFAULT_TITLE)
        .to_string();
    let tags = resolve_tags(value, TAGS);
    let summary = resolve_str(value, SUMMARY)
        .map(str::to_string)
        .or_else(|| resolve_str(value, CONTENT).map(summarize))
        .unwrap_or_else(|| title.clone());
    let published_at = resolve_str(value, PUBLISHED_AT)
        .and_then(parse_timestamp)
        .unwrap_or(fetch_epoch);
    let category = classify(&title, &tags);

    NewsItem {
        id: format!("api-news-{}-{}", fetch_epoch.timestamp_millis(), index),
        title,
        summary,
        published_at,
        source: resolve_str(value, SOURCE).unwrap_or(DEFAULT_SOURCE).to_string(),
        url: resolve_str(value, URL).unwrap_or(DEFAULT_URL).to_string(),
        image_url: resolve_str(value, IMAGE_URL).map(str::to_string),
        tags,
        category,
    }
}

/// Normalize a whole response, keeping upstream order.
pub fn normalize_all(records: &[RawRecord], fetch_epoch: DateTime<Utc>) -> Vec<NewsItem> {
    records
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize(raw, index, fetch_epoch))
        .collect()
}

fn resolve_str<'a>(value: &'a Value, path: FieldPath) -> Option<&'a str> {
    path.iter()
        .filter_map(|pointer| value.pointer(pointer))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn resolve_tags(value: &Value, path: FieldPath) -> Vec<String> {
    path.iter()
        .filter_map(|pointer| value.pointer(pointer))
        .find_map(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn summarize(content: &str) -> String {
    if content.chars().count() > SUMMARY_MAX_CHARS {
        let head: String = content.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}...", head.trim_end())
    } else {
        content.to_string()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
