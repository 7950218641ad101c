//! Body of a push event.

use serde::Serialize;

use crate::format::{format_cpf, format_phone};
use crate::models::{VisitorRecord, VisitorStatus};

/// Which action a push event records in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PushAction {
    #[serde(rename = "ENTRADA")]
    Entry,
    #[serde(rename = "SAIDA")]
    Exit,
}

/// One row-append request for the spreadsheet script.
///
/// CPF and phone are sent masked, the way the sheet displays them.
/// `timestamp` is the time of the push; `exit_time` repeats it for exits and
/// is empty for entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub action: PushAction,
    pub full_name: String,
    pub cpf: String,
    pub phone: String,
    pub responsible: String,
    pub status: String,
    pub timestamp: String,
    pub exit_time: String,
}

impl PushPayload {
    pub fn from_record(record: &VisitorRecord, now: &str) -> Self {
        let (action, exit_time) = match record.status {
            VisitorStatus::Inside => (PushAction::Entry, String::new()),
            VisitorStatus::Departed => (PushAction::Exit, now.to_string()),
        };

        Self {
            action,
            full_name: record.full_name.clone(),
            cpf: format_cpf(&record.identifier),
            phone: format_phone(&record.phone),
            responsible: record.responsible.clone(),
            status: record.status.sheet_label().to_string(),
            timestamp: now.to_string(),
            exit_time,
        }
    }
}
