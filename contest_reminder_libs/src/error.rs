use crate::contest::Platform;
use thiserror::Error;

/// Failure to obtain a contest listing from an upstream platform.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to request contest listing")]
    RequestError(#[from] reqwest::Error),
    #[error("failed to deserialize contest listing")]
    DeserializeError(#[from] serde_json::Error),
    #[error("upstream returned status {0}")]
    StatusError(reqwest::StatusCode),
    #[error("unexpected response schema: {0}")]
    SchemaError(String),
    #[error("invalid endpoint url given")]
    InvalidUrlError(#[from] url::ParseError),
    #[error("fetch timed out after {0} seconds")]
    TimeoutError(u64),
}

/// A start time that none of the platform's known formats accept.
#[derive(Debug, Error)]
#[error("unrecognized {platform} start time `{raw}`")]
pub struct FormatError {
    pub platform: Platform,
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to reach chat api")]
    RequestError(#[from] reqwest::Error),
    #[error("chat api rejected message to {user_id}: {reason}")]
    Rejected { user_id: i64, reason: String },
    #[error("delivery to {user_id} timed out after {secs} seconds")]
    TimeoutError { user_id: i64, secs: u64 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("subscription query failed")]
    DatabaseError(#[from] sqlx::Error),
    #[error("invalid lead time {0}, must be positive")]
    InvalidLeadTime(i32),
}
