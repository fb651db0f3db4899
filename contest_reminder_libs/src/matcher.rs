use crate::{
    aggregator::ContestsByPlatform,
    contest::{Contest, Platform},
    subscription::{Subscription, UserId},
};
use chrono::{DateTime, Duration, Utc};

/// Default tolerance around the reminder target, equal to the default poll interval.
pub fn default_window() -> Duration {
    Duration::hours(1)
}

/// A contest one user should be reminded of in the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMatch {
    pub user_id: UserId,
    pub platform: Platform,
    pub contest: Contest,
}

/// Whether `now` lies strictly within `window` of the contest start minus the lead time.
pub fn is_due(now: DateTime<Utc>, contest: &Contest, lead_hours: i32, window: Duration) -> bool {
    let target = contest.start_time - Duration::hours(i64::from(lead_hours));
    (now - target).abs() < window
}

/// Pair every subscribed user with the contests on their platforms whose reminder is due.
pub fn find_matches(
    now: DateTime<Utc>,
    contests: &ContestsByPlatform,
    subscriptions: &[Subscription],
    window: Duration,
) -> Vec<ReminderMatch> {
    subscriptions
        .iter()
        .filter(|subscription| subscription.is_subscribed)
        .flat_map(|subscription| {
            subscription.platforms.iter().flat_map(move |platform| {
                contests
                    .get(platform)
                    .into_iter()
                    .flatten()
                    .filter(move |contest| {
                        is_due(now, contest, subscription.reminder_lead_hours, window)
                    })
                    .map(move |contest| ReminderMatch {
                        user_id: subscription.user_id,
                        platform: *platform,
                        contest: contest.clone(),
                    })
            })
        })
        .collect()
}
