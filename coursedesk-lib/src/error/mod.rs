//! Error types

mod api;
mod auth;
mod feed;

pub use api::*;
pub use auth::*;
pub use feed::*;

/// Top-level error returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request reached the transport layer and failed there or at the server.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Authentication or session failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Notification feed failure.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns the HTTP status code if this error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(api) => api.status_code(),
            _ => None,
        }
    }

    /// Returns `true` if the session is gone and the user must log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::SessionExpired | AuthError::RefreshFailed { .. })
        )
    }
}
