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

pub const DEFAULT_URL: &str = "https://codeforces.com/api/contest.list";

#[derive(Debug, Deserialize)]
struct ContestListResponse {
    status: String,
    comment: Option<String>,
    result: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeforcesContest {
    name: String,
    phase: String,
    start_time_seconds: Option<i64>,
    duration_seconds: Option<i64>,
}

/// Codeforces `contest.list` API. Upcoming contests are the ones in phase `BEFORE`.
pub struct CodeforcesSource {
    url: Url,
}

impl CodeforcesSource {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn from_url(url: &str) -> Result<Self, FetchError> {
        Ok(Self::new(Url::parse(url)?))
    }
}

impl Default for CodeforcesSource {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_URL).unwrap())
    }
}

#[async_trait]
impl ContestSource for CodeforcesSource {
    fn platform(&self) -> Platform {
        Platform::Codeforces
    }

    async fn fetch(&self, client: &Client) -> Result<String, FetchError> {
        tracing::info!("Start to retrieve contests information from Codeforces");
        send(client.get(self.url.clone())).await
    }

    fn normalize(&self, body: &str, _now: DateTime<Utc>) -> Result<Vec<Contest>, FetchError> {
        let response: ContestListResponse = serde_json::from_str(body)?;
        if response.status != "OK" {
            return Err(FetchError::SchemaError(format!(
                "status {} returned: {}",
                response.status,
                response.comment.unwrap_or_default()
            )));
        }
        let records = response
            .result
            .ok_or(FetchError::SchemaError(String::from("missing result")))?;

        let contests = decode_records::<CodeforcesContest>(self.platform(), records)
            .into_iter()
            .filter(|contest| contest.phase == "BEFORE")
            .filter_map(|contest| {
                let Some(seconds) = contest.start_time_seconds else {
                    tracing::warn!("drop contest {}: start time not announced", contest.name);
                    return None;
                };
                let start_time = match parse_start_time(seconds, Platform::Codeforces) {
                    Ok(start_time) => start_time,
                    Err(e) => {
                        tracing::warn!("drop contest {}: {}", contest.name, e);
                        return None;
                    }
                };
                let duration = resolve_duration(contest.duration_seconds, DurationUnit::Seconds);

                build_contest(Platform::Codeforces, &contest.name, start_time, duration)
            })
            .collect();

        Ok(contests)
    }
}
