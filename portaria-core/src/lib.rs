//! Portaria Core Library
//!
//! Visitor records, local storage and spreadsheet sync for the Portaria
//! front desk.

pub mod desk;
pub mod format;
pub mod models;
pub mod scan;
pub mod storage;
pub mod store;
pub mod sync;

pub use desk::{DeskError, FrontDesk, RefreshOutcome, ReturningVisitor, SnapshotSummary};
pub use models::{EntryDraft, FieldErrors, SyncStatus, VisitStats, VisitorRecord, VisitorStatus};
pub use scan::{DocumentScanner, OcrClient, ScanError, ScanResult};
pub use storage::{LocalStorage, StorageError, StorageKey};
pub use store::RecordStore;
pub use sync::{CloudClient, PushOutcome, Snapshot, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
