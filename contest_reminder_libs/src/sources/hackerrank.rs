use super::{build_contest, decode_records, send, ContestSource};
use crate::{
    contest::{Contest, Platform},
    error::{FetchError, FormatError},
    normalizer::{duration_between, parse_start_time, resolve_duration, DurationUnit, RawTime},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::USER_AGENT, Client, Url};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_URL: &str = "https://www.hackerrank.com/rest/contests";

/// The contests endpoint refuses requests without a browser user agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const PAGE_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct ContestListResponse {
    #[serde(default)]
    models: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct HackerRankContest {
    name: String,
    start_time: Option<String>,
    get_starttimeiso: Option<String>,
    epoch_starttime: Option<i64>,
    end_time: Option<String>,
    get_endtimeiso: Option<String>,
    epoch_endtime: Option<i64>,
    /// Seconds.
    duration: Option<i64>,
}

fn first_parsed(candidates: &[Option<RawTime>]) -> Result<DateTime<Utc>, FormatError> {
    let mut error = None;
    for raw in candidates.iter().flatten() {
        match parse_start_time(*raw, Platform::HackerRank) {
            Ok(datetime) => return Ok(datetime),
            Err(e) => {
                error.get_or_insert(e);
            }
        }
    }

    Err(error.unwrap_or(FormatError {
        platform: Platform::HackerRank,
        raw: String::new(),
    }))
}

impl HackerRankContest {
    fn start_time(&self) -> Result<DateTime<Utc>, FormatError> {
        first_parsed(&[
            self.start_time.as_deref().map(RawTime::Text),
            self.get_starttimeiso.as_deref().map(RawTime::Text),
            self.epoch_starttime.map(RawTime::Epoch),
        ])
    }

    fn end_time(&self) -> Option<DateTime<Utc>> {
        first_parsed(&[
            self.end_time.as_deref().map(RawTime::Text),
            self.get_endtimeiso.as_deref().map(RawTime::Text),
            self.epoch_endtime.map(RawTime::Epoch),
        ])
        .ok()
    }
}

/// HackerRank contests REST API. Upcoming contests are the ones starting after `now`.
pub struct HackerRankSource {
    url: Url,
}

impl HackerRankSource {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn from_url(url: &str) -> Result<Self, FetchError> {
        Ok(Self::new(Url::parse(url)?))
    }
}

impl Default for HackerRankSource {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_URL).unwrap())
    }
}

#[async_trait]
impl ContestSource for HackerRankSource {
    fn platform(&self) -> Platform {
        Platform::HackerRank
    }

    async fn fetch(&self, client: &Client) -> Result<String, FetchError> {
        tracing::info!("Start to retrieve contests information from HackerRank");
        let request = client
            .get(self.url.clone())
            .query(&[("offset", 0), ("limit", PAGE_LIMIT)])
            .header(USER_AGENT, BROWSER_USER_AGENT);
        send(request).await
    }

    fn normalize(&self, body: &str, now: DateTime<Utc>) -> Result<Vec<Contest>, FetchError> {
        let response: ContestListResponse = serde_json::from_str(body)?;

        let contests = decode_records::<HackerRankContest>(self.platform(), response.models)
            .into_iter()
            .filter_map(|contest| {
                let start_time = match contest.start_time() {
                    Ok(start_time) => start_time,
                    Err(e) => {
                        tracing::warn!("drop contest {}: {}", contest.name, e);
                        return None;
                    }
                };
                if start_time <= now {
                    return None;
                }
                let duration = match contest.end_time() {
                    Some(end_time) => duration_between(start_time, end_time),
                    None => resolve_duration(contest.duration, DurationUnit::Seconds),
                };

                build_contest(Platform::HackerRank, &contest.name, start_time, duration)
            })
            .collect();

        Ok(contests)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    fn at(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_normalize() {
        let now = at("2024-03-01T00:00:00Z");
        let body = serde_json::json!({
            "models": [
                {
                    "id": 1,
                    "slug": "spring-codesprint",
                    "name": "Spring CodeSprint",
                    "get_starttimeiso": "2024-03-15T09:00:00Z",
                    "get_endtimeiso": "2024-03-15T13:00:00Z",
                    "epoch_starttime": 1710493200,
                    "epoch_endtime": 1710507600
                },
                {
                    "id": 2,
                    "name": "Hour Rank",
                    "start_time": "2024-03-20T10:00:00Z",
                    "duration": 3600
                },
                {
                    "id": 3,
                    "name": "Epoch Only",
                    "epoch_starttime": 1710493200
                },
                {
                    "id": 4,
                    "name": "Winter CodeSprint",
                    "get_starttimeiso": "2024-01-15T09:00:00Z",
                    "get_endtimeiso": "2024-01-15T13:00:00Z"
                },
                {
                    "id": 5,
                    "name": "Undated"
                }
            ],
            "total": 5
        })
        .to_string();

        let contests = HackerRankSource::default().normalize(&body, now).unwrap();

        assert_eq!(contests.len(), 3);
        assert_eq!(contests[0].name, "Spring CodeSprint");
        assert_eq!(contests[0].start_time, at("2024-03-15T09:00:00Z"));
        assert_eq!(contests[0].duration, Some(Duration::hours(4)));
        assert_eq!(contests[1].name, "Hour Rank");
        assert_eq!(contests[1].duration, Some(Duration::hours(1)));
        assert_eq!(contests[2].name, "Epoch Only");
        assert_eq!(contests[2].start_time, at("2024-03-15T09:00:00Z"));
        assert_eq!(contests[2].duration, None);
    }

    #[test]
    fn test_normalize_empty() {
        let contests = HackerRankSource::default()
            .normalize(r#"{"models": []}"#, Utc::now())
            .unwrap();

        assert!(contests.is_empty());
    }
}
