use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ActiveCommand, ConfigCommand, EntryCommand, ExitCommand, HistoryCommand, ReportCommand,
    ResponsiblesCommand, StatsCommand, SyncCommand,
};
use config::Config;
use portaria_core::{CloudClient, FrontDesk, LocalStorage};

#[derive(Parser)]
#[command(name = "portaria")]
#[command(version)]
#[command(about = "Visitor log for the building front desk", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Work on local records only, without contacting the spreadsheet
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a visitor entry
    Entry(EntryCommand),

    /// Register a visitor exit
    Exit(ExitCommand),

    /// List visitors currently inside
    Active(ActiveCommand),

    /// List recent departures
    History(HistoryCommand),

    /// Search all records
    Report(ReportCommand),

    /// Show today's counters
    Stats(StatsCommand),

    /// List cached responsible parties
    Responsibles(ResponsiblesCommand),

    /// Pull the spreadsheet now
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portaria=warn,portaria_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;
    let storage = LocalStorage::new(config.data_dir.value.clone());
    tracing::debug!("Data directory: {}", config.data_dir.value.display());

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config, &storage),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let cloud = if cli.offline {
        CloudClient::disabled()
    } else {
        let webhook_url = match &config.webhook_url.value {
            Some(url) => Some(url.clone()),
            None => storage.webhook_url()?,
        };
        CloudClient::new(webhook_url).with_refresh_delay(config.refresh_delay())
    };

    if !cloud.is_configured() {
        tracing::debug!("No webhook configured, running offline");
    }

    let mut desk = FrontDesk::open(storage, cloud)?;

    // The sync command pulls on its own and reports errors
    if !matches!(command, Commands::Sync(_)) {
        desk.startup_refresh().await;
    }

    let result = execute_command(&command, &mut desk, &config).await;

    // Follow-up pulls after pushes (only if command succeeded)
    if result.is_ok() {
        desk.run_scheduled_refreshes().await;
    }

    result
}

async fn execute_command(
    command: &Commands,
    desk: &mut FrontDesk,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Entry(cmd) => cmd.run(desk, config).await?,
        Commands::Exit(cmd) => cmd.run(desk).await?,
        Commands::Active(cmd) => cmd.run(desk.store())?,
        Commands::History(cmd) => cmd.run(desk.store())?,
        Commands::Report(cmd) => cmd.run(desk.store())?,
        Commands::Stats(cmd) => cmd.run(desk.store())?,
        Commands::Responsibles(cmd) => cmd.run(desk.store())?,
        Commands::Sync(cmd) => cmd.run(desk, config).await?,
        Commands::Config(cmd) => cmd.run(config, desk.store().storage())?,
    }

    Ok(())
}
