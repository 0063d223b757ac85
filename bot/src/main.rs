use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use learning_groups_bot::config::BotConfig;
use learning_groups_bot::console;
use learning_groups_bot::engine::handlers::Dispatcher;
use learning_groups_bot::engine::lifecycle::GroupEngine;
use learning_groups_bot::help::commands::default_registry;
use learning_groups_bot::platform::memory::MemoryPlatform;
use learning_groups_bot::store::{GroupStore, HeaderStore};

#[derive(Parser)]
#[command(version, about = "Learning group channel manager")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "learning-groups.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy)]
enum Mode {
    /// Load config and data files, report, and exit
    Check,
    /// Drive the bot from stdin against an in-memory platform
    Console,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BotConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let store = GroupStore::load(config.state_file()).context("loading group state")?;
    let headers = HeaderStore::load(config.course_file()).context("loading course headers")?;

    match cli.command.unwrap_or(Mode::Console) {
        Mode::Check => {
            info!(
                groups = store.groups().len(),
                requests = store.requests().len(),
                courses = headers.len(),
                directory_message = ?store.directory_message_id(),
                "configuration ok"
            );
        }
        Mode::Console => {
            let platform = Arc::new(MemoryPlatform::new());
            console::seed_platform(&platform, &config, &store);

            let engine =
                GroupEngine::new(config.to_group_settings(), store, headers, platform.clone());
            let dispatcher = Dispatcher::new(engine, default_registry(), config.bot.user_id.clone());

            info!("console ready, reading events from stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run(stdin, dispatcher, platform).await;
        }
    }

    Ok(())
}
