//! Spreadsheet sync over a webhook.
//!
//! ## Protocol
//!
//! 1. Pull: `GET <webhook>?t=<millis>` returns the whole sheet as
//!    `{responsibles, visitors}`; the local list is replaced wholesale.
//! 2. Push: `POST <webhook>` with a `text/plain` JSON body appends one entry
//!    or exit row. The response is not read; a push counts as delivered once
//!    it was sent.
//! 3. After a push, one pull is scheduled a short delay later so the new
//!    row is folded back into the local list.
//!
//! A pull that was sent before a local write and lands after it overwrites
//! that write; nothing here merges.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock_sheet;
mod payload;
mod snapshot;
mod timer;

pub use client::{CloudClient, PushOutcome};
pub use error::SyncError;
pub use payload::{PushAction, PushPayload};
pub use snapshot::{column, decode_row, DecodeError, DecodedRows, Snapshot};
pub use timer::{RefreshTimer, TokioTimer, DEFAULT_REFRESH_DELAY};
