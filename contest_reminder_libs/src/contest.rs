use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// Contest platforms the reminder knows how to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Codeforces,
    CodeChef,
    LeetCode,
    HackerRank,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Codeforces,
        Platform::CodeChef,
        Platform::LeetCode,
        Platform::HackerRank,
    ];

    /// Key used in the stored platform list.
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Codeforces => "codeforces",
            Platform::CodeChef => "codechef",
            Platform::LeetCode => "leetcode",
            Platform::HackerRank => "hackerrank",
        }
    }

    /// Two letter code used in chat button payloads.
    pub fn short_code(&self) -> &'static str {
        match self {
            Platform::Codeforces => "cf",
            Platform::CodeChef => "cc",
            Platform::LeetCode => "lc",
            Platform::HackerRank => "hr",
        }
    }

    pub fn from_short_code(code: &str) -> Option<Platform> {
        Platform::ALL
            .into_iter()
            .find(|platform| platform.short_code() == code)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Codeforces => write!(f, "Codeforces"),
            Platform::CodeChef => write!(f, "CodeChef"),
            Platform::LeetCode => write!(f, "LeetCode"),
            Platform::HackerRank => write!(f, "HackerRank"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown platform `{}`", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|platform| platform.key() == key || platform.short_code() == key)
            .ok_or(UnknownPlatform(s.to_string()))
    }
}

/// Parse a comma delimited platform list, skipping blank and unknown entries.
pub fn parse_platform_list(text: &str) -> BTreeSet<Platform> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<Platform>() {
            Ok(platform) => Some(platform),
            Err(e) => {
                tracing::warn!("ignore stored platform entry: {}", e);
                None
            }
        })
        .collect()
}

pub fn format_platform_list(platforms: &BTreeSet<Platform>) -> String {
    platforms.iter().map(|platform| platform.key()).join(",")
}

/// A normalized upcoming contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    pub platform: Platform,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub duration: Option<Duration>,
}

impl Contest {
    /// Duration rounded down to whole hours, if the source published one.
    pub fn duration_hours(&self) -> Option<i64> {
        self.duration.map(|duration| duration.num_hours())
    }
}
