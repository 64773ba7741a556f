//! Notification feed error types

/// Errors raised by the notification socket.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The socket URL could not be derived from the base URL.
    #[error("Invalid socket URL: {0}")]
    InvalidUrl(String),

    /// A frame could not be encoded or decoded.
    #[error("Socket frame error: {0}")]
    Frame(#[from] serde_json::Error),
}
