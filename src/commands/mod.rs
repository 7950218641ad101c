mod config_cmd;
mod entry;
mod exit;
mod sync_cmd;
mod views;

use clap::ValueEnum;

pub use config_cmd::ConfigCommand;
pub use entry::EntryCommand;
pub use exit::ExitCommand;
pub use sync_cmd::SyncCommand;
pub use views::{ActiveCommand, HistoryCommand, ReportCommand, ResponsiblesCommand, StatsCommand};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
