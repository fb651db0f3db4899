pub mod check;
pub mod contests;
pub mod run;

use clap::Args;

const DEFAULT_FETCH_TIMEOUT: u64 = 30;
const DEFAULT_WINDOW_MINUTES: i64 = 60;

/// Options shared by the commands that fetch contests and match subscribers.
#[derive(Debug, Args)]
pub struct EngineArgs {
    /// Seconds each contest source may take before it is given up for the cycle.
    #[arg(long)]
    fetch_timeout: Option<u64>,
    /// Minutes of tolerance around each reminder target.
    #[arg(long)]
    window: Option<i64>,
    /// Keep subscriptions in memory instead of the database.
    #[arg(long)]
    memory_store: bool,
}

impl EngineArgs {
    pub fn fetch_timeout(&self) -> u64 {
        match self.fetch_timeout {
            Some(secs) if secs > 0 => secs,
            Some(secs) => {
                tracing::warn!(
                    "fetch timeout must be positive but {} given. Default value {} seconds will be used.",
                    secs,
                    DEFAULT_FETCH_TIMEOUT
                );
                DEFAULT_FETCH_TIMEOUT
            }
            None => {
                tracing::info!("Contest fetch timeout defaults to {} seconds.", DEFAULT_FETCH_TIMEOUT);
                DEFAULT_FETCH_TIMEOUT
            }
        }
    }

    pub fn window(&self) -> chrono::Duration {
        match self.window {
            Some(minutes) if minutes > 0 => chrono::Duration::minutes(minutes),
            Some(minutes) => {
                tracing::warn!(
                    "window must be positive but {} given. Default value {} minutes will be used.",
                    minutes,
                    DEFAULT_WINDOW_MINUTES
                );
                chrono::Duration::minutes(DEFAULT_WINDOW_MINUTES)
            }
            None => chrono::Duration::minutes(DEFAULT_WINDOW_MINUTES),
        }
    }
}
