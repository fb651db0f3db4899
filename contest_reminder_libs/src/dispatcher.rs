use crate::{
    contest::Platform,
    error::DeliveryError,
    matcher::ReminderMatch,
    message::format_reminder,
    subscription::UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{collections::HashSet, sync::Arc};
use tokio::{
    sync::Mutex,
    time::{self, Duration},
};

/// Longest a single delivery may take before it counts as failed.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound text delivery to a chat user.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DeliveryKey {
    user_id: UserId,
    platform: Platform,
    name: String,
    start_time: DateTime<Utc>,
}

impl From<&ReminderMatch> for DeliveryKey {
    fn from(found: &ReminderMatch) -> Self {
        DeliveryKey {
            user_id: found.user_id,
            platform: found.platform,
            name: found.contest.name.clone(),
            start_time: found.contest.start_time,
        }
    }
}

/// Reminders already delivered by this process.
///
/// A rescheduled contest gets a new key and is reminded again.
#[derive(Debug, Default)]
pub struct ReminderLedger {
    delivered: HashSet<DeliveryKey>,
}

impl ReminderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, found: &ReminderMatch) -> bool {
        self.delivered.contains(&DeliveryKey::from(found))
    }

    pub fn record(&mut self, found: &ReminderMatch) {
        self.delivered.insert(DeliveryKey::from(found));
    }

    /// Forget contests that already started. Returns the number of removed entries.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.delivered.len();
        self.delivered.retain(|key| key.start_time > now);
        before - self.delivered.len()
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Delivers reminder matches, at most once per user and contest.
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    ledger: Mutex<ReminderLedger>,
    send_timeout: Duration,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self::with_send_timeout(messenger, DEFAULT_SEND_TIMEOUT)
    }

    pub fn with_send_timeout(messenger: Arc<dyn Messenger>, send_timeout: Duration) -> Self {
        Self {
            messenger,
            ledger: Mutex::new(ReminderLedger::new()),
            send_timeout,
        }
    }

    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        match time::timeout(self.send_timeout, self.messenger.send_text(user_id, text)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::TimeoutError {
                user_id,
                secs: self.send_timeout.as_secs(),
            }),
        }
    }

    /// Send every match not yet delivered. Failed sends are logged and retried next cycle.
    pub async fn dispatch(&self, matches: &[ReminderMatch], now: DateTime<Utc>) -> DispatchReport {
        let mut ledger = self.ledger.lock().await;
        let pruned = ledger.prune(now);
        if pruned > 0 {
            tracing::debug!("{} delivered reminders expired from ledger.", pruned);
        }

        let mut report = DispatchReport::default();
        for found in matches {
            if ledger.contains(found) {
                tracing::debug!(
                    "reminder of {} for user {} already delivered",
                    found.contest.name,
                    found.user_id
                );
                report.skipped += 1;
                continue;
            }

            let text = format_reminder(&found.contest);
            match self.send(found.user_id, &text).await {
                Ok(()) => {
                    tracing::info!(
                        "Reminder of {} contest {} sent to user {}",
                        found.platform,
                        found.contest.name,
                        found.user_id
                    );
                    ledger.record(found);
                    report.sent += 1;
                }
                Err(e) => {
                    tracing::error!("failed to send reminder to user {}: {}", found.user_id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    pub async fn delivered_count(&self) -> usize {
        self.ledger.lock().await.len()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::contest::Contest;
    use chrono::Duration;

    /// Messenger that records sent messages and rejects the listed users.
    #[derive(Default)]
    pub(crate) struct RecordingMessenger {
        pub sent: Mutex<Vec<(UserId, String)>>,
        pub rejected: HashSet<UserId>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send_text(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
            if self.rejected.contains(&user_id) {
                return Err(DeliveryError::Rejected {
                    user_id,
                    reason: String::from("Forbidden: bot was blocked by the user"),
                });
            }
            self.sent.lock().await.push((user_id, text.to_string()));
            Ok(())
        }
    }

    /// Messenger whose requests are accepted but never answered.
    pub(crate) struct StalledMessenger;

    #[async_trait]
    impl Messenger for StalledMessenger {
        async fn send_text(&self, _user_id: UserId, _text: &str) -> Result<(), DeliveryError> {
            std::future::pending().await
        }
    }

    fn reminder(user_id: UserId, name: &str, start_time: DateTime<Utc>) -> ReminderMatch {
        ReminderMatch {
            user_id,
            platform: Platform::Codeforces,
            contest: Contest {
                platform: Platform::Codeforces,
                name: name.to_string(),
                start_time,
                duration: None,
            },
        }
    }

    #[tokio::test]
    async fn test_dispatch_once() {
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher = Dispatcher::new(messenger.clone());
        let now = Utc::now();
        let matches = vec![
            reminder(1, "Round 1", now + Duration::hours(24)),
            reminder(2, "Round 1", now + Duration::hours(24)),
        ];

        let first = dispatcher.dispatch(&matches, now).await;
        let second = dispatcher
            .dispatch(&matches, now + Duration::minutes(30))
            .await;

        assert_eq!(first.sent, 2);
        assert_eq!(second.sent, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(messenger.sent.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retried() {
        let messenger = Arc::new(RecordingMessenger {
            rejected: HashSet::from([2]),
            ..RecordingMessenger::default()
        });
        let dispatcher = Dispatcher::new(messenger.clone());
        let now = Utc::now();
        let matches = vec![
            reminder(1, "Round 1", now + Duration::hours(24)),
            reminder(2, "Round 1", now + Duration::hours(24)),
        ];

        let report = dispatcher.dispatch(&matches, now).await;

        assert_eq!(
            report,
            DispatchReport {
                sent: 1,
                skipped: 0,
                failed: 1
            }
        );
        assert_eq!(dispatcher.delivered_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_delivery_times_out() {
        let dispatcher =
            Dispatcher::with_send_timeout(Arc::new(StalledMessenger), time::Duration::from_secs(5));
        let now = Utc::now();
        let matches = vec![reminder(1, "Round 1", now + Duration::hours(24))];

        let report = dispatcher.dispatch(&matches, now).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 0);
        assert_eq!(dispatcher.delivered_count().await, 0);
    }

    #[test]
    fn test_ledger_prune() {
        let now = Utc::now();
        let mut ledger = ReminderLedger::new();
        ledger.record(&reminder(1, "Past", now - Duration::hours(1)));
        ledger.record(&reminder(1, "Future", now + Duration::hours(1)));

        assert_eq!(ledger.prune(now), 1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(&reminder(1, "Future", now + Duration::hours(1))));
    }

    #[test]
    fn test_rescheduled_contest_is_new() {
        let now = Utc::now();
        let mut ledger = ReminderLedger::new();
        ledger.record(&reminder(1, "Round 1", now + Duration::hours(24)));

        assert!(!ledger.contains(&reminder(1, "Round 1", now + Duration::hours(26))));
    }
}
