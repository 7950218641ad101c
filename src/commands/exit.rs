use clap::Args;

use portaria_core::format::{digits, CPF_DIGITS};
use portaria_core::sync::RefreshTimer;
use portaria_core::FrontDesk;

use super::OutputFormat;

/// Register a visitor exit
#[derive(Args)]
pub struct ExitCommand {
    /// Record ID, or the CPF of a visitor currently inside
    visitor: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ExitCommand {
    pub async fn run<T: RefreshTimer>(
        &self,
        desk: &mut FrontDesk<T>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let id = self.resolve_id(desk)?;
        let record = desk.register_exit(&id).await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            OutputFormat::Text => {
                println!("Exit registered:");
                println!();
                println!("{}", record);
            }
        }

        Ok(())
    }

    /// Accepts a record id as is; a CPF is resolved to the single open
    /// entry for that visitor.
    fn resolve_id<T: RefreshTimer>(&self, desk: &FrontDesk<T>) -> Result<String, String> {
        if desk.store().get(&self.visitor).is_some() {
            return Ok(self.visitor.clone());
        }

        let cpf = digits(&self.visitor);
        if cpf.len() != CPF_DIGITS {
            return Ok(self.visitor.clone());
        }

        let open: Vec<_> = desk
            .store()
            .active()
            .into_iter()
            .filter(|r| digits(&r.identifier) == cpf)
            .collect();

        match open.as_slice() {
            [record] => Ok(record.id.clone()),
            [] => Err(format!("No open entry for CPF {}", self.visitor)),
            _ => Err(format!(
                "CPF {} has {} open entries; pass the record ID instead",
                self.visitor,
                open.len()
            )),
        }
    }
}
