use crate::{
    contest::{Contest, Platform},
    error::FetchError,
    sources::{ContestSource, SourceRegistry},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use std::collections::BTreeMap;
use tokio::time::{self, Duration};

pub type ContestsByPlatform = BTreeMap<Platform, Vec<Contest>>;

/// Runs every registered source and gathers their upcoming contests.
pub struct Aggregator {
    registry: SourceRegistry,
    client: Client,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(registry: SourceRegistry, client: Client, timeout: Duration) -> Self {
        Self {
            registry,
            client,
            timeout,
        }
    }

    /// Collect upcoming contests from all sources concurrently.
    ///
    /// The result has an entry for every platform. A source that fails or exceeds the timeout
    /// contributes an empty list without affecting the others.
    pub async fn collect(&self, now: DateTime<Utc>) -> ContestsByPlatform {
        tracing::info!("Start to collect contests from {} sources.", self.registry.len());

        let tasks = self
            .registry
            .iter()
            .map(|source| self.collect_one(source, now));
        let results = join_all(tasks).await;

        let mut contests: ContestsByPlatform = Platform::ALL
            .into_iter()
            .map(|platform| (platform, Vec::new()))
            .collect();
        for (platform, found) in results {
            contests.insert(platform, found);
        }

        tracing::info!(
            "{} contests collected.",
            contests.values().map(Vec::len).sum::<usize>()
        );

        contests
    }

    async fn collect_one(
        &self,
        source: &dyn ContestSource,
        now: DateTime<Utc>,
    ) -> (Platform, Vec<Contest>) {
        let platform = source.platform();
        match time::timeout(self.timeout, source.fetch_upcoming(&self.client, now)).await {
            Ok(contests) => (platform, contests),
            Err(_) => {
                let e = FetchError::TimeoutError(self.timeout.as_secs());
                tracing::error!("failed to fetch {} contests: {}", platform, e);
                (platform, Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;

    struct StaticSource {
        platform: Platform,
        body: Result<&'static str, ()>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ContestSource for StaticSource {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn fetch(&self, _client: &Client) -> Result<String, FetchError> {
            if let Some(delay) = self.delay {
                time::sleep(delay).await;
            }
            self.body
                .map(String::from)
                .map_err(|_| FetchError::SchemaError(String::from("connection reset")))
        }

        fn normalize(&self, body: &str, now: DateTime<Utc>) -> Result<Vec<Contest>, FetchError> {
            let names: Vec<String> = serde_json::from_str(body)?;
            Ok(names
                .into_iter()
                .map(|name| Contest {
                    platform: self.platform,
                    name,
                    start_time: now + chrono::Duration::days(1),
                    duration: None,
                })
                .collect())
        }
    }

    fn source(platform: Platform, body: Result<&'static str, ()>) -> StaticSource {
        StaticSource {
            platform,
            body,
            delay: None,
        }
    }

    #[tokio::test]
    async fn test_collect_all_platforms() {
        let mut registry = SourceRegistry::new();
        registry.register(source(Platform::Codeforces, Ok(r#"["Round 1", "Round 2"]"#)));
        registry.register(source(Platform::LeetCode, Ok(r#"["Weekly 1"]"#)));
        let aggregator = Aggregator::new(registry, Client::new(), Duration::from_secs(5));

        let contests = aggregator.collect(Utc::now()).await;

        assert_eq!(contests.len(), 4);
        assert_eq!(contests[&Platform::Codeforces].len(), 2);
        assert_eq!(contests[&Platform::LeetCode].len(), 1);
        assert!(contests[&Platform::CodeChef].is_empty());
        assert!(contests[&Platform::HackerRank].is_empty());
    }

    /// A failing source must not change what the other sources return.
    #[tokio::test]
    async fn test_collect_isolates_failures() {
        let mut registry = SourceRegistry::new();
        registry.register(source(Platform::Codeforces, Ok(r#"["Round 1"]"#)));
        registry.register(source(Platform::CodeChef, Err(())));
        registry.register(source(Platform::LeetCode, Ok(r#"["Weekly 1"]"#)));
        registry.register(source(Platform::HackerRank, Ok("not json")));
        let aggregator = Aggregator::new(registry, Client::new(), Duration::from_secs(5));

        let contests = aggregator.collect(Utc::now()).await;

        assert_eq!(contests[&Platform::Codeforces][0].name, "Round 1");
        assert_eq!(contests[&Platform::LeetCode][0].name, "Weekly 1");
        assert!(contests[&Platform::CodeChef].is_empty());
        assert!(contests[&Platform::HackerRank].is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_times_out_slow_source() {
        let mut registry = SourceRegistry::new();
        registry.register(source(Platform::Codeforces, Ok(r#"["Round 1"]"#)));
        registry.register(StaticSource {
            platform: Platform::CodeChef,
            body: Ok(r#"["Starters"]"#),
            delay: Some(Duration::from_secs(60)),
        });
        let aggregator = Aggregator::new(registry, Client::new(), Duration::from_secs(10));

        let contests = aggregator.collect(Utc::now()).await;

        assert_eq!(contests[&Platform::Codeforces].len(), 1);
        assert!(contests[&Platform::CodeChef].is_empty());
    }
}
