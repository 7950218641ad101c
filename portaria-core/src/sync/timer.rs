//! Delay before reading the sheet back after a push.

use std::future::Future;
use std::time::Duration;

/// Default wait between a push and its follow-up pull. The spreadsheet
/// script needs a moment to append the row before it shows up in a read.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(2);

/// Source of the follow-up delay, injected so tests do not sleep.
pub trait RefreshTimer {
    fn wait(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl RefreshTimer for TokioTimer {
    fn wait(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(delay)
    }
}
