mod draft;
mod status;
mod visitor;

pub use draft::{EntryDraft, FieldErrors};
pub use status::{SyncStatus, VisitorStatus};
pub use visitor::{VisitStats, VisitorRecord};
