pub mod codechef;
pub mod codeforces;
pub mod hackerrank;
pub mod leetcode;

use crate::{
    contest::{Contest, Platform},
    error::FetchError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

pub use codechef::CodeChefSource;
pub use codeforces::CodeforcesSource;
pub use hackerrank::HackerRankSource;
pub use leetcode::LeetCodeSource;

/// One upstream contest listing.
///
/// `fetch` performs exactly one request and returns the raw body, `normalize` turns that body
/// into upcoming contests. Records that can't be normalized are dropped one by one.
#[async_trait]
pub trait ContestSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch(&self, client: &Client) -> Result<String, FetchError>;

    fn normalize(&self, body: &str, now: DateTime<Utc>) -> Result<Vec<Contest>, FetchError>;

    /// Fetch and normalize, logging any failure and returning no contests instead.
    async fn fetch_upcoming(&self, client: &Client, now: DateTime<Utc>) -> Vec<Contest> {
        let platform = self.platform();
        let body = match self.fetch(client).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("failed to fetch {} contests: {}", platform, e);
                return Vec::new();
            }
        };

        match self.normalize(&body, now) {
            Ok(contests) => {
                tracing::info!("{} upcoming {} contests retrieved.", contests.len(), platform);
                contests
            }
            Err(e) => {
                tracing::error!("failed to read {} contest listing: {}", platform, e);
                Vec::new()
            }
        }
    }
}

/// Endpoint overrides for the sources. Unset entries use the public APIs.
#[derive(Debug, Clone, Default)]
pub struct SourceEndpoints {
    pub codeforces: Option<String>,
    pub codechef: Option<String>,
    pub leetcode: Option<String>,
    pub hackerrank: Option<String>,
}

/// Contest sources keyed by platform.
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<Platform, Box<dyn ContestSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of every supported platform using the given endpoints.
    pub fn from_endpoints(endpoints: &SourceEndpoints) -> Result<Self, FetchError> {
        let mut registry = Self::new();
        registry.register(match &endpoints.codeforces {
            Some(url) => CodeforcesSource::from_url(url)?,
            None => CodeforcesSource::default(),
        });
        registry.register(match &endpoints.codechef {
            Some(url) => CodeChefSource::from_url(url)?,
            None => CodeChefSource::default(),
        });
        registry.register(match &endpoints.leetcode {
            Some(url) => LeetCodeSource::from_url(url)?,
            None => LeetCodeSource::default(),
        });
        registry.register(match &endpoints.hackerrank {
            Some(url) => HackerRankSource::from_url(url)?,
            None => HackerRankSource::default(),
        });

        Ok(registry)
    }

    /// Register a source, replacing any previous source for the same platform.
    pub fn register(&mut self, source: impl ContestSource + 'static) {
        self.sources.insert(source.platform(), Box::new(source));
    }

    pub fn get(&self, platform: Platform) -> Option<&dyn ContestSource> {
        self.sources.get(&platform).map(|source| source.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ContestSource> {
        self.sources.values().map(|source| source.as_ref())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Send a request and return the body, treating non-success statuses as errors.
pub(crate) async fn send(request: RequestBuilder) -> Result<String, FetchError> {
    let res = request.send().await?;
    if let Err(e) = res.error_for_status_ref() {
        tracing::warn!("error response returned from upstream: {:?}", e);
        return Err(FetchError::StatusError(res.status()));
    }

    Ok(res.text().await?)
}

/// Deserialize each record on its own so that one malformed entry doesn't spoil the listing.
pub(crate) fn decode_records<T: DeserializeOwned>(platform: Platform, records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<T>(record) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skip malformed {} record at {}: {}", platform, i, e);
                None
            }
        })
        .collect()
}

/// Build a contest, dropping records without a usable name.
pub(crate) fn build_contest(
    platform: Platform,
    name: &str,
    start_time: DateTime<Utc>,
    duration: Option<chrono::Duration>,
) -> Option<Contest> {
    let name = name.trim();
    if name.is_empty() {
        tracing::warn!("skip {} contest without a name", platform);
        return None;
    }

    Some(Contest {
        platform,
        name: name.to_string(),
        start_time,
        duration,
    })
}
