//! Authentication error types

/// Errors that can occur during authentication and token refresh.
///
/// `Clone` so a single refresh failure can be handed to every request that
/// was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// Login rejected by the backend.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// The refresh call failed; the session has been cleared.
    #[error("Token refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The refresh endpoint itself answered 401; the session has been cleared.
    #[error("Session expired")]
    SessionExpired,

    /// The refresh flow was dropped before it produced a result.
    #[error("Token refresh aborted")]
    RefreshAborted,

    /// Reading or writing the persisted token failed.
    #[error("Token store error: {0}")]
    Store(String),

    /// Failed to parse an authentication response.
    #[error("Auth response parse error: {0}")]
    Parse(String),
}

impl From<async_sqlite::Error> for AuthError {
    fn from(err: async_sqlite::Error) -> Self {
        Self::Store(err.to_string())
    }
}
