//! Read-only listings over the local record store.

use chrono::Local;
use clap::Args;

use portaria_core::format::{format_cpf, format_short};
use portaria_core::{RecordStore, VisitorRecord};

use super::OutputFormat;

/// Visitors currently inside
#[derive(Args)]
pub struct ActiveCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ActiveCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        print_records(&store.active(), &self.format, "Nobody inside")
    }
}

/// Latest departures
#[derive(Args)]
pub struct HistoryCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl HistoryCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        print_records(&store.history(), &self.format, "No departures recorded")
    }
}

/// Search all records by name or CPF
#[derive(Args)]
pub struct ReportCommand {
    /// Name fragment or CPF digits; lists everything when omitted
    query: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ReportCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        let records = store.search(self.query.as_deref().unwrap_or_default());

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
            OutputFormat::Text => {
                if records.is_empty() {
                    println!("No records found");
                    return Ok(());
                }
                for record in &records {
                    println!(
                        "{:<32} {:<16} {:<7} {}",
                        record.full_name,
                        format_cpf(&record.identifier),
                        record.status,
                        format_short(&record.entry_time)
                    );
                }
                println!("\nTotal: {} record(s)", records.len());
            }
        }

        Ok(())
    }
}

/// Today's counters
#[derive(Args)]
pub struct StatsCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl StatsCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        let stats = store.stats(Local::now().date_naive());

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            OutputFormat::Text => {
                println!("Inside now:    {}", stats.active_now);
                println!("Entries today: {}", stats.total_today);
            }
        }

        Ok(())
    }
}

/// Cached responsible parties
#[derive(Args)]
pub struct ResponsiblesCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ResponsiblesCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(store.responsibles())?);
            }
            OutputFormat::Text => {
                if store.responsibles().is_empty() {
                    println!("No responsible parties cached. Run `portaria sync` first.");
                }
                for name in store.responsibles() {
                    println!("{}", name);
                }
            }
        }

        Ok(())
    }
}

fn print_records(
    records: &[&VisitorRecord],
    format: &OutputFormat,
    empty: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("{}", empty);
                return Ok(());
            }
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", record);
            }
        }
    }

    Ok(())
}
