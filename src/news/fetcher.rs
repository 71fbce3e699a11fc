use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::news::{RawRecord, SearchQuery};

/// Anything that can answer a news search with raw records.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawRecord>>;
}

#[derive(Debug, Serialize)]
struct SearchRequestBody<'a> {
    query: &'a str,
    size: usize,
    sort: Value,
    filter: Value,
}

impl<'a> SearchRequestBody<'a> {
    fn from_query(query: &'a SearchQuery) -> Self {
        Self {
            query: &query.query,
            size: query.max_results,
            sort: json!([{ "published_at": { "order": "desc" } }]),
            filter: json!({
                "published_at": { "gte": query.since.format("%Y-%m-%d").to_string() }
            }),
        }
    }
}

/// HTTP client for the news search API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    user_agent: String,
}

impl SearchClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, api_key, Duration::from_secs(10), default_user_agent())
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Self::with_options(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout),
            config.user_agent.clone(),
        )
    }

    pub fn with_options(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
        user_agent: String,
    ) -> Result<Self> {
        validate_base_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/search", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            user_agent,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, query: &SearchQuery) -> Result<Response> {
        let body = SearchRequestBody::from_query(query);

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .json(&body)
            .send()
            .await?;

        Ok(response)
    }
}

#[async_trait]
impl NewsSource for SearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawRecord>> {
        debug!("Searching {} (size {}, since {})", self.endpoint, query.max_results, query.since);

        let response = self.send(query).await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "HTTP {} from {}: {}",
                response.status().as_u16(),
                self.endpoint,
                response.status().canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to read response body: {}", e)))?;

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| Error::Upstream(format!("Malformed response body: {}", e)))?;

        let records = extract_records(payload);
        debug!("Received {} records from {}", records.len(), self.endpoint);
        Ok(records)
    }
}

/// Pull the record list out of a response, accepting `hits`, `hits.hits`
/// or `documents`.
pub fn extract_records(payload: Value) -> Vec<RawRecord> {
    let mut payload = match payload {
        Value::Object(map) => map,
        other => {
            warn!("Search response is not an object ({}), treating as empty", type_name(&other));
            return Vec::new();
        }
    };

    let list = match payload.remove("hits") {
        Some(Value::Array(hits)) => Some(hits),
        Some(Value::Object(mut inner)) => match inner.remove("hits") {
            Some(Value::Array(hits)) => Some(hits),
            _ => None,
        },
        _ => None,
    }
    .or_else(|| match payload.remove("documents") {
        Some(Value::Array(documents)) => Some(documents),
        _ => None,
    });

    list.unwrap_or_default().into_iter().map(RawRecord::new).collect()
}

pub fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| Error::InvalidUrl(format!("Invalid URL {}: {}", base_url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::InvalidUrl(format!("Unsupported scheme: {}", scheme))),
    }
}

fn default_user_agent() -> String {
    format!("ai-news-cache/{}", env!("CARGO_PKG_VERSION"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
