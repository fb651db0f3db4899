use crate::modules::context::AppContext;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use contest_reminder_libs::{contest::parse_platform_list, message::format_upcoming_contests};

#[derive(Debug, Args)]
pub struct ContestsArgs {
    /// Comma separated platforms to show, e.g. `cf,leetcode`. All platforms when omitted.
    #[arg(long)]
    platforms: Option<String>,
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,
}

pub async fn run(args: ContestsArgs) -> Result<()> {
    let context = AppContext::from_env(args.fetch_timeout)?;
    let aggregator = context.aggregator()?;

    let mut contests = aggregator.collect(Utc::now()).await;
    if let Some(platforms) = &args.platforms {
        let platforms = parse_platform_list(platforms);
        contests.retain(|platform, _| platforms.contains(platform));
    }

    println!("{}", format_upcoming_contests(&contests));
    Ok(())
}
