//! Decoding of the spreadsheet snapshot.
//!
//! The webhook returns the whole sheet as a row-major table. The first row
//! is a header; every other row maps positionally onto a [`VisitorRecord`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::format::{cell_digits, cell_text};
use crate::models::{SyncStatus, VisitorRecord, VisitorStatus};

/// Column positions in the visitor sheet.
pub mod column {
    pub const ENTRY_TIME: usize = 0;
    pub const FULL_NAME: usize = 1;
    pub const CPF: usize = 2;
    pub const PHONE: usize = 3;
    pub const STATUS: usize = 4;
    pub const EXIT_TIME: usize = 5;
    pub const RESPONSIBLE: usize = 6;
}

/// Body of a pull response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub responsibles: Option<Vec<String>>,
    #[serde(default)]
    pub visitors: Option<Vec<Vec<Value>>>,
}

/// Why a sheet row did not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The CPF cell is empty once non-digits are stripped. This is the only
    /// required column; every other cell defaults to an empty string.
    #[error("row {row}: CPF column is empty")]
    MissingIdentifier { row: usize },
}

/// Decodes one data row. `index` is the zero-based position after the
/// header and is part of the record id.
pub fn decode_row(index: usize, row: &[Value]) -> Result<VisitorRecord, DecodeError> {
    let identifier = cell_digits(row.get(column::CPF));
    if identifier.is_empty() {
        return Err(DecodeError::MissingIdentifier { row: index });
    }

    let exit_time = cell_text(row.get(column::EXIT_TIME));

    Ok(VisitorRecord {
        id: format!("{}{}", identifier, index),
        full_name: cell_text(row.get(column::FULL_NAME)).to_uppercase(),
        identifier,
        phone: cell_digits(row.get(column::PHONE)),
        responsible: cell_text(row.get(column::RESPONSIBLE)),
        entry_time: cell_text(row.get(column::ENTRY_TIME)),
        exit_time: (!exit_time.is_empty()).then_some(exit_time),
        status: VisitorStatus::from_sheet(&cell_text(row.get(column::STATUS))),
        sync_status: SyncStatus::Synced,
    })
}

/// Records decoded from a snapshot table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRows {
    pub records: Vec<VisitorRecord>,
    pub dropped: Vec<DecodeError>,
}

impl Snapshot {
    /// Decodes the visitor table.
    ///
    /// Returns `None` when the table is absent or holds no data rows, in
    /// which case the local list should be left alone.
    pub fn decode_visitors(&self) -> Option<DecodedRows> {
        let rows = self.visitors.as_ref()?;
        if rows.len() < 2 {
            return None;
        }

        let mut decoded = DecodedRows::default();
        for (index, row) in rows.iter().skip(1).enumerate() {
            match decode_row(index, row) {
                Ok(record) => decoded.records.push(record),
                Err(e) => {
                    tracing::debug!("Skipping sheet {}", e);
                    decoded.dropped.push(e);
                }
            }
        }
        Some(decoded)
    }
}
