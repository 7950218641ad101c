//! Sync CLI commands for pulling the spreadsheet on demand.

use clap::{Args, Subcommand};

use portaria_core::sync::RefreshTimer;
use portaria_core::{DeskError, FrontDesk, SyncError, SyncStatus};

use crate::config::Config;

/// Pull the spreadsheet into local state
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and local sync state
    Status,
}

impl SyncCommand {
    pub async fn run<T: RefreshTimer>(
        &self,
        desk: &mut FrontDesk<T>,
        config: &Config,
    ) -> Result<(), SyncCommandError> {
        match &self.command {
            None => self.sync(desk).await,
            Some(SyncSubcommand::Status) => {
                self.status(desk, config);
                Ok(())
            }
        }
    }

    async fn sync<T: RefreshTimer>(&self, desk: &mut FrontDesk<T>) -> Result<(), SyncCommandError> {
        let Some(snapshot) = desk.fetch_snapshot().await? else {
            return Err(SyncCommandError::NotConfigured);
        };

        println!("Pulling spreadsheet...");
        let summary = desk.apply_snapshot(&snapshot)?;

        match summary.records {
            Some(count) => println!("  ✓ {} visitor record(s)", count),
            None => println!("  - visitor table empty, local records kept"),
        }
        if summary.dropped_rows > 0 {
            println!("  ✗ {} row(s) skipped without a CPF", summary.dropped_rows);
        }
        match summary.responsibles {
            Some(count) => println!("  ✓ {} responsible name(s)", count),
            None => println!("  - no responsible list, cache kept"),
        }

        println!();
        println!("Sync complete.");
        Ok(())
    }

    fn status<T: RefreshTimer>(&self, desk: &FrontDesk<T>, config: &Config) {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let Some(url) = desk.cloud().webhook_url() else {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, save the spreadsheet webhook:");
            println!();
            println!("  portaria config set-webhook https://script.google.com/macros/s/.../exec");
            println!();
            println!("Or set webhook_url in your config file, or PORTARIA_WEBHOOK_URL.");
            return;
        };

        let source = if config.webhook_url.value.is_some() {
            config.webhook_url.source.to_string()
        } else {
            "saved".to_string()
        };

        println!("Webhook:       {} ({})", url, source);
        println!(
            "Refresh delay: {} ms",
            desk.cloud().refresh_delay().as_millis()
        );
        println!();

        let records = desk.store().records();
        let pending = records
            .iter()
            .filter(|r| r.sync_status == SyncStatus::Pending)
            .count();
        let failed = records
            .iter()
            .filter(|r| r.sync_status == SyncStatus::Error)
            .count();

        println!("Local records: {}", records.len());
        println!("  pending:     {}", pending);
        println!("  failed:      {}", failed);
    }
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    NotConfigured,
    SyncError(SyncError),
    DeskError(DeskError),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::NotConfigured => write!(
                f,
                "Cloud sync is not configured. Run `portaria sync status` for setup help."
            ),
            SyncCommandError::SyncError(e) => write!(f, "{}", e),
            SyncCommandError::DeskError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::NotConfigured => None,
            SyncCommandError::SyncError(e) => Some(e),
            SyncCommandError::DeskError(e) => Some(e),
        }
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::SyncError(e)
    }
}

impl From<DeskError> for SyncCommandError {
    fn from(e: DeskError) -> Self {
        SyncCommandError::DeskError(e)
    }
}
