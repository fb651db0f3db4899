use super::{build_contest, decode_records, send, ContestSource};
use crate::{
    contest::{Contest, Platform},
    error::FetchError,
    normalizer::{parse_start_time, resolve_duration, DurationUnit},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_URL: &str = "https://leetcode.com/graphql";

const ALL_CONTESTS_QUERY: &str = r#"
{
    allContests {
        title
        titleSlug
        startTime
        duration
    }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<AllContests>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllContests {
    all_contests: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeetCodeContest {
    title: String,
    start_time: i64,
    duration: Option<i64>,
}

/// LeetCode GraphQL API. Upcoming contests are the ones starting after `now`.
pub struct LeetCodeSource {
    url: Url,
}

impl LeetCodeSource {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn from_url(url: &str) -> Result<Self, FetchError> {
        Ok(Self::new(Url::parse(url)?))
    }
}

impl Default for LeetCodeSource {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_URL).unwrap())
    }
}

#[async_trait]
impl ContestSource for LeetCodeSource {
    fn platform(&self) -> Platform {
        Platform::LeetCode
    }

    async fn fetch(&self, client: &Client) -> Result<String, FetchError> {
        tracing::info!("Start to retrieve contests information from LeetCode");
        let query = serde_json::json!({ "query": ALL_CONTESTS_QUERY });
        send(client.post(self.url.clone()).json(&query)).await
    }

    fn normalize(&self, body: &str, now: DateTime<Utc>) -> Result<Vec<Contest>, FetchError> {
        let response: GraphQlResponse = serde_json::from_str(body)?;
        let records = response
            .data
            .ok_or(FetchError::SchemaError(String::from("missing data")))?
            .all_contests;

        let contests = decode_records::<LeetCodeContest>(self.platform(), records)
            .into_iter()
            .filter_map(|contest| {
                let start_time = match parse_start_time(contest.start_time, Platform::LeetCode) {
                    Ok(start_time) => start_time,
                    Err(e) => {
                        tracing::warn!("drop contest {}: {}", contest.title, e);
                        return None;
                    }
                };
                if start_time <= now {
                    return None;
                }
                let duration = resolve_duration(contest.duration, DurationUnit::Seconds);

                build_contest(Platform::LeetCode, &contest.title, start_time, duration)
            })
            .collect();

        Ok(contests)
    }
}
