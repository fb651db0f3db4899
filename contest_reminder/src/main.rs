mod cmd;
mod modules;

use crate::cmd::{
    check::{self, CheckArgs},
    contests::{self, ContestsArgs},
    run::{self, RunArgs},
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{env, str::FromStr};
use tokio::runtime::Builder;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{self, time::OffsetTime},
};

#[derive(Debug, Parser)]
#[command(name = "contest_reminder")]
#[command(about = "Reminds Telegram users of upcoming programming contests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the Telegram bot and the reminder scheduler.
    Run(RunArgs),
    /// Print upcoming contests of every platform.
    Contests(ContestsArgs),
    /// Run one matching cycle and print the due reminders.
    Check(CheckArgs),
}

fn main() {
    dotenv().ok();

    let log_level = env::var("RUST_LOG").unwrap_or(String::from("info"));
    let filter = EnvFilter::builder()
        .with_default_directive(
            LevelFilter::from_str(&log_level)
                .unwrap_or(LevelFilter::INFO)
                .into(),
        )
        .from_env_lossy();
    let format = fmt::format()
        .with_level(true)
        .with_target(true)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_timer(OffsetTime::local_rfc_3339().expect("couldn't get local time offset"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    match Cli::parse().command {
        Commands::Run(args) => runtime.block_on(run::run(args)),
        Commands::Contests(args) => runtime.block_on(contests::run(args)),
        Commands::Check(args) => runtime.block_on(check::run(args)),
    }
    .expect("command failed");
}
