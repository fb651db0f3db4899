use super::{build_contest, decode_records, send, ContestSource};
use crate::{
    contest::{Contest, Platform},
    error::{FetchError, FormatError},
    normalizer::{parse_start_time, resolve_duration, DurationUnit},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

pub const DEFAULT_URL: &str = "https://www.codechef.com/api/list/contests/all";

#[derive(Debug, Deserialize)]
struct ContestListResponse {
    #[serde(default)]
    future_contests: Vec<Value>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct CodeChefContest {
    contest_name: String,
    contest_start_date: Option<String>,
    contest_start_date_iso: Option<String>,
    /// Minutes, published either as a number or as a numeric string.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    contest_duration: Option<i64>,
}

impl CodeChefContest {
    /// The display date first, the ISO date when the display date is absent or unreadable.
    fn start_time(&self) -> Result<DateTime<Utc>, FormatError> {
        let candidates = [&self.contest_start_date, &self.contest_start_date_iso];
        let mut error = FormatError {
            platform: Platform::CodeChef,
            raw: String::new(),
        };
        for raw in candidates.into_iter().flatten() {
            match parse_start_time(raw.as_str(), Platform::CodeChef) {
                Ok(start_time) => return Ok(start_time),
                Err(e) if error.raw.is_empty() => error = e,
                Err(_) => {}
            }
        }

        Err(error)
    }
}

/// CodeChef contest list API. Every entry of `future_contests` is upcoming.
pub struct CodeChefSource {
    url: Url,
}

impl CodeChefSource {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn from_url(url: &str) -> Result<Self, FetchError> {
        Ok(Self::new(Url::parse(url)?))
    }
}

impl Default for CodeChefSource {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_URL).unwrap())
    }
}

#[async_trait]
impl ContestSource for CodeChefSource {
    fn platform(&self) -> Platform {
        Platform::CodeChef
    }

    async fn fetch(&self, client: &Client) -> Result<String, FetchError> {
        tracing::info!("Start to retrieve contests information from CodeChef");
        send(client.get(self.url.clone())).await
    }

    fn normalize(&self, body: &str, _now: DateTime<Utc>) -> Result<Vec<Contest>, FetchError> {
        let response: ContestListResponse = serde_json::from_str(body)?;

        let contests = decode_records::<CodeChefContest>(self.platform(), response.future_contests)
            .into_iter()
            .filter_map(|contest| {
                let start_time = match contest.start_time() {
                    Ok(start_time) => start_time,
                    Err(e) => {
                        tracing::warn!("drop contest {}: {}", contest.contest_name, e);
                        return None;
                    }
                };
                let duration = resolve_duration(contest.contest_duration, DurationUnit::Minutes);

                build_contest(Platform::CodeChef, &contest.contest_name, start_time, duration)
            })
            .collect();

        Ok(contests)
    }
}
