use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a visitor is still on the premises.
///
/// Serialized with the Portuguese tokens used by the spreadsheet and by
/// previously persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitorStatus {
    #[serde(rename = "dentro")]
    Inside,
    #[serde(rename = "saiu")]
    Departed,
}

impl VisitorStatus {
    /// Label written to the spreadsheet status column.
    pub fn sheet_label(&self) -> &'static str {
        match self {
            VisitorStatus::Inside => "Dentro",
            VisitorStatus::Departed => "Saiu",
        }
    }

    /// Reads a spreadsheet status cell. Only "dentro" (any case, surrounding
    /// whitespace ignored) means inside; everything else counts as departed.
    pub fn from_sheet(cell: &str) -> Self {
        if cell.trim().eq_ignore_ascii_case("dentro") {
            VisitorStatus::Inside
        } else {
            VisitorStatus::Departed
        }
    }
}

impl fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitorStatus::Inside => write!(f, "dentro"),
            VisitorStatus::Departed => write!(f, "saiu"),
        }
    }
}

impl FromStr for VisitorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dentro" | "inside" => Ok(VisitorStatus::Inside),
            "saiu" | "departed" => Ok(VisitorStatus::Departed),
            _ => Err(format!(
                "Invalid visitor status '{}'. Valid options: dentro, saiu",
                s
            )),
        }
    }
}

/// Replication state of a record against the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    #[default]
    Pending,
    /// The last push could not be dispatched.
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Pending => write!(f, "pending"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_sheet() {
        assert_eq!(VisitorStatus::from_sheet("Dentro"), VisitorStatus::Inside);
        assert_eq!(VisitorStatus::from_sheet("  DENTRO "), VisitorStatus::Inside);
        assert_eq!(VisitorStatus::from_sheet("Saiu"), VisitorStatus::Departed);
        assert_eq!(VisitorStatus::from_sheet(""), VisitorStatus::Departed);
    }

    #[test]
    fn test_status_sheet_label() {
        assert_eq!(VisitorStatus::Inside.sheet_label(), "Dentro");
        assert_eq!(VisitorStatus::Departed.sheet_label(), "Saiu");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            VisitorStatus::from_str("inside").unwrap(),
            VisitorStatus::Inside
        );
        assert_eq!(
            VisitorStatus::from_str("SAIU").unwrap(),
            VisitorStatus::Departed
        );
        assert!(VisitorStatus::from_str("gone").is_err());
    }

    #[test]
    fn test_status_json_tokens() {
        assert_eq!(
            serde_json::to_string(&VisitorStatus::Inside).unwrap(),
            "\"dentro\""
        );
        assert_eq!(
            serde_json::to_string(&SyncStatus::Pending).unwrap(),
            "\"pending\""
        );
        let parsed: SyncStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, SyncStatus::Error);
    }
}
