//! Sync error types.

/// Errors that can occur while talking to the spreadsheet webhook.
#[derive(Debug)]
pub enum SyncError {
    /// The request could not be sent or the connection failed
    ConnectionError(String),
    /// The webhook answered a pull with a non-success status
    HttpStatus(u16),
    /// The pull response body was not a snapshot
    InvalidResponse(String),
    /// The push payload could not be encoded
    EncodeError(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::ConnectionError(e) => write!(f, "Connection error: {}", e),
            SyncError::HttpStatus(status) => write!(f, "Webhook returned status {}", status),
            SyncError::InvalidResponse(e) => write!(f, "Invalid snapshot: {}", e),
            SyncError::EncodeError(e) => write!(f, "Failed to encode push event: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}
