use clap::Args;
use std::path::{Path, PathBuf};

use portaria_core::format::{format_cpf, format_phone};
use portaria_core::scan::{mime_for_extension, scan_into_draft};
use portaria_core::sync::RefreshTimer;
use portaria_core::{EntryDraft, FrontDesk, OcrClient};

use super::OutputFormat;
use crate::config::Config;

/// Register a visitor entry
#[derive(Args)]
pub struct EntryCommand {
    /// Visitor CPF (digits or 000.000.000-00)
    #[arg(long)]
    cpf: Option<String>,

    /// Full name; prefilled for returning visitors
    #[arg(long)]
    name: Option<String>,

    /// Phone number; prefilled for returning visitors
    #[arg(long)]
    phone: Option<String>,

    /// Responsible party (see `portaria responsibles`)
    #[arg(long, short)]
    responsible: Option<String>,

    /// Photo of the visitor's document to read name and CPF from
    #[arg(long, value_name = "IMAGE")]
    scan: Option<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl EntryCommand {
    pub async fn run<T: RefreshTimer>(
        &self,
        desk: &mut FrontDesk<T>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut draft = EntryDraft::new();

        if let Some(image) = &self.scan {
            self.scan_document(image, config, &mut draft).await?;
        }
        if let Some(cpf) = &self.cpf {
            draft.set_cpf(cpf);
        }

        if let Some(found) = desk.prefill(&mut draft) {
            println!("Returning visitor: {}", found.record.full_name);
            if found.currently_inside {
                eprintln!(
                    "Warning: CPF {} is already marked as inside",
                    format_cpf(&found.record.identifier)
                );
            }
        }

        if let Some(name) = &self.name {
            draft.full_name = name.to_uppercase();
        }
        if let Some(phone) = &self.phone {
            draft.phone = format_phone(phone);
        }
        if let Some(responsible) = &self.responsible {
            draft.responsible = responsible.clone();
        }

        let known = desk.store().responsibles();
        if !known.is_empty() && !draft.responsible.is_empty() && !known.contains(&draft.responsible)
        {
            eprintln!(
                "Warning: '{}' is not in the responsible list",
                draft.responsible
            );
        }

        let record = desk.register_entry(&draft).await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            OutputFormat::Text => {
                println!("Entry registered:");
                println!();
                println!("{}", record);
            }
        }

        Ok(())
    }

    async fn scan_document(
        &self,
        image: &Path,
        config: &Config,
        draft: &mut EntryDraft,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let endpoint = config
            .ocr_url
            .value
            .as_ref()
            .ok_or("Document scan needs an OCR endpoint. Set ocr_url in the config file.")?;

        let bytes = std::fs::read(image)
            .map_err(|e| format!("Failed to read image '{}': {}", image.display(), e))?;
        let mime_type = mime_for_extension(image.extension().and_then(|e| e.to_str()));

        let scanner = OcrClient::new(endpoint.clone());
        if !scan_into_draft(&scanner, &bytes, mime_type, draft).await {
            eprintln!("Document scan failed; continuing with the values given");
        }

        Ok(())
    }
}
