use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] coursedesk_lib::Error),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine a data directory for the session database")]
    NoDataDir,

    #[error("Not logged in. Run `coursedesk login` first.")]
    NotLoggedIn,
}

impl From<coursedesk_lib::error::AuthError> for CliError {
    fn from(e: coursedesk_lib::error::AuthError) -> Self {
        Self::Client(e.into())
    }
}
