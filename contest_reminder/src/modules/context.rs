use anyhow::{Context, Result};
use contest_reminder_libs::{
    aggregator::Aggregator,
    sources::{SourceEndpoints, SourceRegistry},
    subscription::{postgres::MIGRATOR, MemorySubscriptionStore, PgSubscriptionStore, SubscriptionStore},
    telegram::{TelegramClient, LONG_POLL_TIMEOUT},
};
use reqwest::Client;
use sqlx::{postgres::Postgres, Pool};
use std::{env, sync::Arc};
use tokio::time::Duration;

/// Upper bound of any single HTTP request. Leaves room for a full `getUpdates` long poll.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(LONG_POLL_TIMEOUT + 30);

/// Clients and settings built once at startup and handed to every component.
pub struct AppContext {
    pub client: Client,
    pub endpoints: SourceEndpoints,
    pub fetch_timeout: Duration,
}

impl AppContext {
    pub fn from_env(fetch_timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .with_context(|| {
                let message = "Failed to create HTTP client.";
                tracing::error!(message);
                message
            })?;

        let endpoints = SourceEndpoints {
            codeforces: env::var("CODEFORCES_API_URL").ok(),
            codechef: env::var("CODECHEF_API_URL").ok(),
            leetcode: env::var("LEETCODE_API_URL").ok(),
            hackerrank: env::var("HACKERRANK_API_URL").ok(),
        };

        Ok(Self {
            client,
            endpoints,
            fetch_timeout: Duration::from_secs(fetch_timeout),
        })
    }

    pub fn aggregator(&self) -> Result<Aggregator> {
        let registry = SourceRegistry::from_endpoints(&self.endpoints).with_context(|| {
            let message = "invalid contest API url given. check the *_API_URL environment variables.";
            tracing::error!(message);
            message
        })?;

        Ok(Aggregator::new(
            registry,
            self.client.clone(),
            self.fetch_timeout,
        ))
    }

    pub fn telegram(&self) -> Result<TelegramClient> {
        let token = env::var("BOT_TOKEN").with_context(|| {
            let message = "BOT_TOKEN must be configured.";
            tracing::error!(message);
            message
        })?;

        TelegramClient::new(&token, self.client.clone()).with_context(|| {
            let message = "couldn't create Telegram client. check the value of BOT_TOKEN.";
            tracing::error!(message);
            message
        })
    }

    /// Subscription store backed by `DATABASE_URL`, migrated on connect, or kept in memory.
    pub async fn store(&self, memory: bool) -> Result<Arc<dyn SubscriptionStore>> {
        if memory {
            tracing::warn!("Subscriptions are kept in memory and will be lost on exit.");
            return Ok(Arc::new(MemorySubscriptionStore::new()));
        }

        let database_url: String = env::var("DATABASE_URL").with_context(|| {
            let message = "DATABASE_URL must be configured.";
            tracing::error!(message);
            message
        })?;

        let pool: Pool<Postgres> = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .with_context(|| {
                let message = "Failed to create database connection pool.";
                tracing::error!(message);
                message
            })?;

        MIGRATOR.run(&pool).await?;

        Ok(Arc::new(PgSubscriptionStore::new(pool)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_request_timeout_outlasts_long_poll() {
        assert!(REQUEST_TIMEOUT > Duration::from_secs(LONG_POLL_TIMEOUT));
    }

    #[test]
    fn test_from_env() {
        let context = AppContext::from_env(15).unwrap();

        assert_eq!(context.fetch_timeout, Duration::from_secs(15));
        assert!(context.aggregator().is_ok());
    }
}
