use crate::{
    aggregator::ContestsByPlatform,
    contest::{Contest, Platform},
    subscription::Subscription,
};
use chrono::{DateTime, Utc};
use itertools::Itertools;

/// Contests shown per platform in a listing.
pub const LISTING_LIMIT: usize = 3;

/// Escape the characters Telegram's legacy Markdown treats as entity markers.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn format_start_time(start_time: &DateTime<Utc>) -> String {
    start_time.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn format_duration(contest: &Contest) -> String {
    match contest.duration_hours() {
        Some(hours) => format!("{}h", hours),
        None => String::from("N/A"),
    }
}

pub fn format_reminder(contest: &Contest) -> String {
    let mut message = format!(
        "🔔 Reminder: {}\nPlatform: {}\nStarts at: {}",
        contest.name,
        contest.platform,
        format_start_time(&contest.start_time)
    );
    if let Some(hours) = contest.duration_hours() {
        message.push_str(&format!("\nDuration: {}h", hours));
    }
    message
}

/// Listing of the next few contests of one platform, soonest first.
pub fn format_platform_contests(platform: Platform, contests: &[Contest]) -> String {
    let mut message = format!("🏆 *{} Contests*\n\n", platform);
    for contest in contests
        .iter()
        .sorted_by_key(|contest| contest.start_time)
        .take(LISTING_LIMIT)
    {
        message.push_str(&format!(
            "📌 *{}*\n⏰ {}\n⌛️ Duration: {}\n\n",
            escape_markdown(&contest.name),
            format_start_time(&contest.start_time),
            format_duration(contest)
        ));
    }
    message
}

pub fn format_upcoming_contests(contests: &ContestsByPlatform) -> String {
    let mut message = String::from("*📅 Upcoming Coding Contests*\n\n");
    let mut any = false;
    for (platform, found) in contests.iter().filter(|(_, found)| !found.is_empty()) {
        any = true;
        message.push_str(&format_platform_contests(*platform, found));
        message.push_str(&"─".repeat(30));
        message.push('\n');
    }
    if !any {
        message.push_str("No upcoming contests found right now.");
    }
    message
}

pub fn format_platform_selection(subscription: Option<&Subscription>) -> String {
    match subscription.filter(|subscription| !subscription.platforms.is_empty()) {
        Some(subscription) => format!(
            "• {}",
            subscription
                .platforms
                .iter()
                .map(|platform| platform.to_string())
                .join("\n• ")
        ),
        None => String::from("No platforms selected"),
    }
}

pub fn format_subscription_status(subscription: Option<&Subscription>) -> String {
    let Some(subscription) = subscription else {
        return String::from(
            "*📊 My Subscriptions*\n\nYou are not subscribed yet.\nOpen ⚙️ Settings to subscribe.",
        );
    };
    let status = if subscription.is_subscribed {
        "✅ Subscribed"
    } else {
        "❌ Unsubscribed"
    };

    format!(
        "*📊 My Subscriptions*\n\nStatus: {}\nReminder: {} hours before start\nPlatforms:\n{}",
        status,
        subscription.reminder_lead_hours,
        format_platform_selection(Some(subscription))
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn contest(name: &str, day: u32, duration: Option<Duration>) -> Contest {
        Contest {
            platform: Platform::Codeforces,
            name: name.to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 3, day, 14, 35, 0).unwrap(),
            duration,
        }
    }

    #[test]
    fn test_format_reminder() {
        let message = format_reminder(&contest("Round 1", 15, Some(Duration::minutes(150))));

        assert_eq!(
            message,
            "🔔 Reminder: Round 1\nPlatform: Codeforces\nStarts at: 2024-03-15 14:35 UTC\nDuration: 2h"
        );
    }

    #[test]
    fn test_format_reminder_without_duration() {
        let message = format_reminder(&contest("Round 1", 15, None));

        assert!(message.ends_with("Starts at: 2024-03-15 14:35 UTC"));
    }

    #[test]
    fn test_platform_listing_limit_and_order() {
        let contests = vec![
            contest("Round 4", 18, None),
            contest("Round 1", 15, Some(Duration::hours(2))),
            contest("Round 3", 17, None),
            contest("Round 2", 16, None),
        ];

        let message = format_platform_contests(Platform::Codeforces, &contests);

        assert!(message.starts_with("🏆 *Codeforces Contests*"));
        assert!(message.contains("📌 *Round 1*\n⏰ 2024-03-15 14:35 UTC\n⌛️ Duration: 2h"));
        assert!(message.contains("⌛️ Duration: N/A"));
        assert!(message.contains("Round 3"));
        assert!(!message.contains("Round 4"));
    }

    #[test]
    fn test_listing_escapes_markdown() {
        let contests = vec![contest("Div_2 *Special* [Rated] `x`", 15, None)];

        let message = format_platform_contests(Platform::Codeforces, &contests);

        assert!(message.contains(r"📌 *Div\_2 \*Special\* \[Rated] \`x\`*"));
        assert_eq!(escape_markdown("Weekly Contest 390"), "Weekly Contest 390");
    }

    #[test]
    fn test_upcoming_contests_empty() {
        let contests: ContestsByPlatform = Platform::ALL
            .into_iter()
            .map(|platform| (platform, Vec::new()))
            .collect::<BTreeMap<_, _>>();

        let message = format_upcoming_contests(&contests);

        assert!(message.contains("No upcoming contests"));
    }

    #[test]
    fn test_subscription_status() {
        let mut subscription = Subscription::new(1);
        subscription.reminder_lead_hours = 48;

        let message = format_subscription_status(Some(&subscription));

        assert!(message.contains("✅ Subscribed"));
        assert!(message.contains("48 hours"));
        assert!(message.contains("• Codeforces\n• CodeChef\n• LeetCode\n• HackerRank"));
        assert!(format_subscription_status(None).contains("not subscribed"));
    }
}
