use crate::{
    aggregator::Aggregator,
    dispatcher::{DispatchReport, Dispatcher},
    matcher::{default_window, find_matches},
    subscription::SubscriptionStore,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use rand::Rng;
use std::{panic::AssertUnwindSafe, sync::Arc};
use tokio::{
    sync::watch,
    time::{self, Duration},
};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Upper bound of the random delay added to each pause.
    pub jitter: Duration,
    /// Tolerance around each reminder target.
    pub window: chrono::Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            jitter: Duration::ZERO,
            window: default_window(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub subscribers: usize,
    pub contests: usize,
    pub matches: usize,
    pub dispatch: DispatchReport,
}

/// Periodically matches subscribers against upcoming contests and sends the due reminders.
pub struct ReminderScheduler {
    aggregator: Aggregator,
    store: Arc<dyn SubscriptionStore>,
    dispatcher: Dispatcher,
    config: SchedulerConfig,
}

impl ReminderScheduler {
    pub fn new(
        aggregator: Aggregator,
        store: Arc<dyn SubscriptionStore>,
        dispatcher: Dispatcher,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            aggregator,
            store,
            dispatcher,
            config,
        }
    }

    /// One pass of store → aggregator → matcher → dispatcher at the given instant.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let subscriptions = self
            .store
            .get_subscribed_users()
            .await
            .context("failed to read subscribed users")?;
        if subscriptions.is_empty() {
            tracing::info!("No subscribed users, skip fetching contests.");
            return Ok(CycleReport::default());
        }

        let contests = self.aggregator.collect(now).await;
        let matches = find_matches(now, &contests, &subscriptions, self.config.window);
        let dispatch = self.dispatcher.dispatch(&matches, now).await;

        Ok(CycleReport {
            subscribers: subscriptions.len(),
            contests: contests.values().map(Vec::len).sum(),
            matches: matches.len(),
            dispatch,
        })
    }

    fn next_delay(&self) -> Duration {
        let jitter = self.config.jitter.as_millis() as u64;
        if jitter == 0 {
            return self.config.interval;
        }
        self.config.interval + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter))
    }

    /// Run cycles until `shutdown` turns true or its sender goes away.
    ///
    /// A failing or panicking cycle is logged and the loop carries on after the usual pause.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Reminder scheduler started with interval {:?}.",
            self.config.interval
        );

        while !*shutdown.borrow() {
            let cycle = AssertUnwindSafe(self.run_cycle(Utc::now())).catch_unwind();
            match cycle.await {
                Ok(Ok(report)) => tracing::info!(
                    "Reminder cycle finished: subscribers={} contests={} matches={} sent={} skipped={} failed={}",
                    report.subscribers,
                    report.contests,
                    report.matches,
                    report.dispatch.sent,
                    report.dispatch.skipped,
                    report.dispatch.failed
                ),
                Ok(Err(e)) => tracing::error!("reminder cycle failed: {:?}", e),
                Err(_) => tracing::error!("reminder cycle panicked"),
            }

            let delay = self.next_delay();
            tokio::select! {
                _ = time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Reminder scheduler stopped.");
    }
}
