use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::status::{SyncStatus, VisitorStatus};
use crate::format::{digits, format_cpf, format_phone, format_short, parse_br_datetime};

/// One visitor's entry/exit log line.
///
/// Field names on the wire match the records persisted by earlier versions
/// of the front desk, so an existing `access_control_visitors` list loads
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    pub id: String,
    pub full_name: String,
    /// CPF digits.
    #[serde(rename = "cpf")]
    pub identifier: String,
    /// Phone digits.
    pub phone: String,
    pub responsible: String,
    pub entry_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<String>,
    pub status: VisitorStatus,
    #[serde(default)]
    pub sync_status: SyncStatus,
}

impl VisitorRecord {
    /// Builds a fresh local entry: new UUID, upper-cased name, digit-only
    /// CPF and phone, inside and waiting to be pushed.
    pub fn new_entry(
        full_name: &str,
        cpf: &str,
        phone: &str,
        responsible: &str,
        entry_time: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.trim().to_uppercase(),
            identifier: digits(cpf),
            phone: digits(phone),
            responsible: responsible.trim().to_string(),
            entry_time: entry_time.into(),
            exit_time: None,
            status: VisitorStatus::Inside,
            sync_status: SyncStatus::Pending,
        }
    }

    pub fn is_inside(&self) -> bool {
        self.status == VisitorStatus::Inside
    }

    /// Flips the record to departed and stamps the exit time.
    pub fn mark_departed(&mut self, exit_time: impl Into<String>) {
        self.status = VisitorStatus::Departed;
        self.exit_time = Some(exit_time.into());
        self.sync_status = SyncStatus::Pending;
    }

    /// Calendar day of the entry, when the timestamp can be parsed.
    pub fn entry_date(&self) -> Option<NaiveDate> {
        parse_br_datetime(&self.entry_time).map(|at| at.date())
    }
}

impl fmt::Display for VisitorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}] ({})", self.full_name, self.status, self.sync_status)?;
        writeln!(f, "  CPF:     {}", format_cpf(&self.identifier))?;
        writeln!(f, "  Phone:   {}", format_phone(&self.phone))?;
        writeln!(f, "  Resp:    {}", self.responsible)?;
        writeln!(f, "  Entry:   {}", format_short(&self.entry_time))?;
        if let Some(exit) = &self.exit_time {
            writeln!(f, "  Exit:    {}", format_short(exit))?;
        }
        write!(f, "  ID:      {}", self.id)
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct VisitStats {
    /// Records whose entry falls on the given day.
    pub total_today: usize,
    /// Records currently inside.
    pub active_now: usize,
}

impl VisitStats {
    pub fn from_records(records: &[VisitorRecord], today: NaiveDate) -> Self {
        Self {
            total_today: records
                .iter()
                .filter(|r| r.entry_date() == Some(today))
                .count(),
            active_now: records.iter().filter(|r| r.is_inside()).count(),
        }
    }
}
