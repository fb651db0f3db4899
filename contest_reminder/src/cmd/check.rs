use crate::cmd::EngineArgs;
use crate::modules::context::AppContext;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use contest_reminder_libs::{
    contest::parse_platform_list,
    dispatcher::Dispatcher,
    matcher::find_matches,
    message::format_start_time,
    subscription::{Subscription, SubscriptionStore, DEFAULT_LEAD_HOURS},
};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Match a synthetic subscription of this user instead of the stored ones.
    #[arg(long)]
    user_id: Option<i64>,
    /// Platforms of the synthetic subscription. All platforms when omitted.
    #[arg(long, requires = "user_id")]
    platforms: Option<String>,
    /// Lead hours of the synthetic subscription.
    #[arg(long, requires = "user_id")]
    lead: Option<i32>,
    /// Evaluate at this RFC 3339 instant instead of now.
    #[arg(long)]
    at: Option<String>,
    /// Deliver the found reminders through Telegram.
    #[arg(long)]
    send: bool,
    #[command(flatten)]
    engine: EngineArgs,
}

pub async fn run(args: CheckArgs) -> Result<()> {
    let now = match &args.at {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .with_context(|| {
                let message = format!("invalid instant {} given to --at", at);
                tracing::error!(message);
                message
            })?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let context = AppContext::from_env(args.engine.fetch_timeout())?;

    let subscriptions = match args.user_id {
        Some(user_id) => {
            let mut subscription = Subscription::new(user_id);
            if let Some(platforms) = &args.platforms {
                subscription.platforms = parse_platform_list(platforms);
            }
            subscription.reminder_lead_hours = args.lead.unwrap_or(DEFAULT_LEAD_HOURS);
            vec![subscription]
        }
        None => {
            let store = context.store(args.engine.memory_store).await?;
            store
                .get_subscribed_users()
                .await
                .context("failed to read subscribed users")?
        }
    };
    tracing::info!("{} subscriptions will be checked at {}.", subscriptions.len(), now);

    let aggregator = context.aggregator()?;
    let contests = aggregator.collect(now).await;
    let matches = find_matches(now, &contests, &subscriptions, args.engine.window());

    if matches.is_empty() {
        println!("No reminders due at {}.", format_start_time(&now));
    }
    for found in &matches {
        println!(
            "user {}: {} [{}] starts at {}",
            found.user_id,
            found.contest.name,
            found.platform,
            format_start_time(&found.contest.start_time)
        );
    }

    if args.send && !matches.is_empty() {
        let dispatcher = Dispatcher::new(Arc::new(context.telegram()?));
        let report = dispatcher.dispatch(&matches, now).await;
        println!(
            "sent={} skipped={} failed={}",
            report.sent, report.skipped, report.failed
        );
    }

    Ok(())
}
