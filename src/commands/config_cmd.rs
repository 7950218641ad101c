use clap::{Args, Subcommand};

use portaria_core::{LocalStorage, StorageKey};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Save the spreadsheet webhook URL in local state
    SetWebhook {
        /// Webhook URL of the spreadsheet script
        url: String,
    },

    /// Forget the saved webhook URL
    ClearWebhook,
}

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        storage: &LocalStorage,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => self.show(config, storage, format),
            ConfigSubcommand::SetWebhook { url } => {
                if url.trim().is_empty() {
                    return Err("Webhook URL cannot be empty".into());
                }
                storage.save_webhook_url(url)?;
                println!("Webhook saved: {}", url.trim());
                if config.webhook_url.value.is_some() {
                    println!(
                        "Note: webhook_url from {} takes precedence",
                        config.webhook_url.source
                    );
                }
                Ok(())
            }
            ConfigSubcommand::ClearWebhook => {
                storage.remove(StorageKey::WebhookUrl)?;
                println!("Saved webhook removed");
                Ok(())
            }
        }
    }

    fn show(
        &self,
        config: &Config,
        storage: &LocalStorage,
        format: &OutputFormat,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let saved_webhook = storage.webhook_url()?;

        match format {
            OutputFormat::Json => {
                let mut value = serde_json::to_value(config)?;
                value["saved_webhook_url"] = serde_json::json!(saved_webhook);
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            OutputFormat::Text => {
                println!("Configuration");
                println!("=============\n");

                if let Some(path) = &config.config_file {
                    println!("Config file: {}", path.display());
                } else {
                    println!(
                        "Config file: {} (not found)",
                        Config::default_config_path().display()
                    );
                }
                println!();

                println!("data_dir: {}", config.data_dir.value.display());
                println!("  source: {}", config.data_dir.source);
                println!();

                match &config.webhook_url.value {
                    Some(url) => {
                        println!("webhook_url: {}", url);
                        println!("  source: {}", config.webhook_url.source);
                    }
                    None => match &saved_webhook {
                        Some(url) => {
                            println!("webhook_url: {}", url);
                            println!("  source: saved");
                        }
                        None => println!("webhook_url: (not set, cloud sync disabled)"),
                    },
                }
                println!();

                println!(
                    "ocr_url: {}",
                    config.ocr_url.value.as_deref().unwrap_or("(not set)")
                );
                println!("  source: {}", config.ocr_url.source);
                println!();

                println!("refresh_delay_ms: {}", config.refresh_delay_ms.value);
                println!("  source: {}", config.refresh_delay_ms.source);
            }
        }
        Ok(())
    }
}
