use crate::{
    cmd::EngineArgs,
    modules::{
        bot::{handler::BotHandler, Bot},
        context::AppContext,
    },
};
use anyhow::{Context, Result};
use clap::Args;
use contest_reminder_libs::{
    dispatcher::Dispatcher,
    scheduler::{ReminderScheduler, SchedulerConfig},
};
use std::sync::Arc;
use tokio::{sync::watch, time::Duration};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Seconds between reminder cycles.
    #[arg(long)]
    interval: Option<u64>,
    /// Upper bound in seconds of a random delay added to each interval.
    #[arg(long, default_value_t = 0)]
    jitter: u64,
    #[command(flatten)]
    engine: EngineArgs,
}

const DEFAULT_INTERVAL: u64 = 3600;

impl RunArgs {
    fn interval(&self) -> u64 {
        match self.interval {
            Some(interval) if interval > 0 => interval,
            Some(interval) => {
                tracing::warn!(
                    "interval must be positive but {} given. Default value {} seconds will be used.",
                    interval,
                    DEFAULT_INTERVAL
                );
                DEFAULT_INTERVAL
            }
            None => {
                tracing::warn!(
                    "Reminder cycles will run at default interval of {} seconds.",
                    DEFAULT_INTERVAL
                );
                DEFAULT_INTERVAL
            }
        }
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let context = AppContext::from_env(args.engine.fetch_timeout())?;
    let telegram = Arc::new(context.telegram()?);
    let me = telegram.get_me().await.with_context(|| {
        let message = "Telegram bot api is not available. check the value of BOT_TOKEN.";
        tracing::error!(message);
        message
    })?;
    tracing::info!("Connected to Telegram as {}", me.username.unwrap_or(me.first_name));

    let store = context.store(args.engine.memory_store).await?;

    let config = SchedulerConfig {
        interval: Duration::from_secs(args.interval()),
        jitter: Duration::from_secs(args.jitter),
        window: args.engine.window(),
    };
    let scheduler = ReminderScheduler::new(
        context.aggregator()?,
        store.clone(),
        Dispatcher::new(telegram.clone()),
        config,
    );
    let bot = Bot::new(
        telegram,
        BotHandler::new(store, Arc::new(context.aggregator()?)),
    );

    let (tx, rx) = watch::channel(false);
    let scheduler_task = {
        let rx = rx.clone();
        tokio::spawn(async move { scheduler.run(rx).await })
    };
    let bot_task = tokio::spawn(async move { bot.run(rx).await });

    shutdown_signal().await;
    if tx.send(true).is_err() {
        tracing::warn!("scheduler and bot already stopped");
    }

    let (scheduler_result, bot_result) = tokio::join!(scheduler_task, bot_task);
    scheduler_result.context("reminder scheduler task failed")?;
    bot_result.context("telegram bot task failed")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping scheduler and bot.");
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn interval(args: &[&str]) -> u64 {
        let cli = Cli::parse_from(std::iter::once("run").chain(args.iter().copied()));
        cli.run.interval()
    }

    #[test]
    fn test_interval() {
        assert_eq!(interval(&["--interval", "600"]), 600);
        assert_eq!(interval(&["--interval", "0"]), DEFAULT_INTERVAL);
        assert_eq!(interval(&[]), DEFAULT_INTERVAL);
    }
}
